use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

pub const MAX_GROUP_ROWS: usize = 100;

/// One line of a group-by result: the group path and its numeric metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRow {
    pub group: String,
    pub metrics: BTreeMap<String, f64>,
}

impl GroupRow {
    pub fn metric(&self, key: &str) -> f64 {
        self.metrics.get(key).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupTable {
    pub rows: Vec<GroupRow>,
    pub metric_keys: Vec<String>,
}

impl GroupTable {
    /// Flattens `statistics.groups`, single or nested, into rows sorted by
    /// the first metric key, largest first.
    pub fn from_statistics(statistics: &Value) -> Option<Self> {
        let groups = statistics.get("groups").and_then(Value::as_array)?;
        let mut rows = Vec::new();

        for entry in groups.iter().filter_map(Value::as_object) {
            for (key, value) in entry {
                match metrics(value) {
                    Some(m) => rows.push(GroupRow {
                        group: clean_group_key(key),
                        metrics: m,
                    }),
                    None => collect(value, vec![key.clone()], &mut rows),
                }
            }
        }

        if rows.is_empty() {
            return None;
        }

        let metric_keys: Vec<String> = rows
            .iter()
            .flat_map(|row| row.metrics.keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        if let Some(primary) = metric_keys.first() {
            rows.sort_by(|a, b| {
                b.metric(primary)
                    .partial_cmp(&a.metric(primary))
                    .unwrap_or(Ordering::Equal)
            });
        }

        Some(Self { rows, metric_keys })
    }

    pub fn overflow(&self) -> usize {
        self.rows.len().saturating_sub(MAX_GROUP_ROWS)
    }
}

fn metrics(value: &Value) -> Option<BTreeMap<String, f64>> {
    let obj = value.as_object().filter(|o| !o.is_empty())?;
    obj.iter()
        .map(|(k, v)| v.as_f64().map(|n| (k.clone(), n)))
        .collect()
}

fn collect(node: &Value, path: Vec<String>, rows: &mut Vec<GroupRow>) {
    if let Some(m) = metrics(node) {
        rows.push(GroupRow {
            group: path.join(" / "),
            metrics: m,
        });
        return;
    }

    let Some(obj) = node.as_object() else {
        return;
    };

    if let Some(totals) = obj.get("totals").and_then(metrics) {
        rows.push(GroupRow {
            group: path.join(" / "),
            metrics: totals,
        });
        return;
    }

    for (key, child) in obj {
        let mut child_path = path.clone();
        child_path.push(key.clone());
        collect(child, child_path, rows);
    }
}

/// `[a, b]` becomes `a | b`.
fn clean_group_key(key: &str) -> String {
    match key.strip_prefix('[').and_then(|k| k.strip_suffix(']')) {
        Some(inner) => inner
            .split(',')
            .map(str::trim)
            .collect::<Vec<_>>()
            .join(" | "),
        None => key.to_string(),
    }
}

/// The flat `stats.global_timeseries` map some aggregate queries return.
pub fn global_timeseries(statistics: &Value) -> Vec<(String, String)> {
    statistics
        .get("stats")
        .and_then(|s| s.get("global_timeseries"))
        .and_then(Value::as_object)
        .map(|obj| {
            obj.iter()
                .map(|(k, v)| {
                    let text = match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    (k.clone(), text)
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flat_groups_sorted_by_first_metric() {
        let stats = json!({"groups": [
            {"alice": {"count": 3.0}},
            {"bob": {"count": 10.0}},
            {"carol": {"count": 7.0}}
        ]});

        let table = GroupTable::from_statistics(&stats).unwrap();
        let groups: Vec<&str> = table.rows.iter().map(|r| r.group.as_str()).collect();
        assert_eq!(groups, vec!["bob", "carol", "alice"]);
        assert_eq!(table.metric_keys, vec!["count"]);
    }

    #[test]
    fn test_bracketed_multi_key_is_cleaned() {
        let stats = json!({"groups": [{"[10.0.0.1, 443]": {"count": 2}}]});
        let table = GroupTable::from_statistics(&stats).unwrap();
        assert_eq!(table.rows[0].group, "10.0.0.1 | 443");
    }

    #[test]
    fn test_nested_groups_join_path_and_use_totals() {
        let stats = json!({"groups": [
            {"web": {"GET": {"count": 5}, "POST": {"totals": {"count": 2}, "extra": "x"}}}
        ]});

        let table = GroupTable::from_statistics(&stats).unwrap();
        let groups: Vec<&str> = table.rows.iter().map(|r| r.group.as_str()).collect();
        assert_eq!(groups, vec!["web / GET", "web / POST"]);
        assert_eq!(table.rows[1].metric("count"), 2.0);
    }

    #[test]
    fn test_metric_keys_union_and_missing_metric_is_zero() {
        let stats = json!({"groups": [
            {"a": {"count": 1, "max": 9}},
            {"b": {"count": 4}}
        ]});

        let table = GroupTable::from_statistics(&stats).unwrap();
        assert_eq!(table.metric_keys, vec!["count", "max"]);
        assert_eq!(table.rows[0].group, "b");
        assert_eq!(table.rows[0].metric("max"), 0.0);
    }

    #[test]
    fn test_no_groups() {
        assert!(GroupTable::from_statistics(&json!({"groups": []})).is_none());
        assert!(GroupTable::from_statistics(&json!({"count": 1})).is_none());
    }

    #[test]
    fn test_overflow_beyond_cap() {
        let groups: Vec<Value> = (0..105)
            .map(|i| {
                let mut entry = serde_json::Map::new();
                entry.insert(format!("g{i}"), json!({"count": i}));
                Value::Object(entry)
            })
            .collect();
        let table = GroupTable::from_statistics(&json!({ "groups": groups })).unwrap();
        assert_eq!(table.overflow(), 5);
        assert_eq!(table.rows[0].group, "g104");
    }

    #[test]
    fn test_global_timeseries_pairs() {
        let stats = json!({"stats": {"global_timeseries": {"count": 42, "unit": "events"}}});
        assert_eq!(
            global_timeseries(&stats),
            vec![
                ("count".to_string(), "42".to_string()),
                ("unit".to_string(), "events".to_string())
            ]
        );
        assert!(global_timeseries(&json!({})).is_empty());
    }
}
