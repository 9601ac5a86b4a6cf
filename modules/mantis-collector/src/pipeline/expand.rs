use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use mantis_common::{CollectorConfig, WorkItem};

static RE_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}]*)\}").expect("valid placeholder regex"));

/// Expand `templates` against one parameter row.
///
/// Every `{name}` placeholder is replaced by its value; placeholders without a
/// matching parameter are left as-is. The label joins the values in sorted key
/// order with `_`, so it depends only on the parameter set.
pub fn build_request(params: &HashMap<String, String>, templates: &[String]) -> (Vec<String>, String) {
    let urls = templates
        .iter()
        .map(|template| expand_template(template, params))
        .collect();
    (urls, label_for(params))
}

fn expand_template(template: &str, params: &HashMap<String, String>) -> String {
    RE_PLACEHOLDER
        .replace_all(template, |caps: &Captures| match params.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

fn label_for(params: &HashMap<String, String>) -> String {
    let mut keys: Vec<&String> = params.keys().collect();
    keys.sort();
    keys.iter()
        .map(|key| params[*key].as_str())
        .collect::<Vec<_>>()
        .join("_")
}

/// One work item per parameter row, in row order.
pub fn build_work_items(rows: Vec<HashMap<String, String>>, config: &CollectorConfig) -> Vec<WorkItem> {
    rows.into_iter()
        .map(|params| {
            let (urls, label) = build_request(&params, &config.sources);
            WorkItem::new(urls, label, config.bucket().to_string(), params)
        })
        .collect()
}
