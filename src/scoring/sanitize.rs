use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::RawFeature;

/// Portable feature value: the only shapes written to the output stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<String>),
}

pub type FeatureMap = BTreeMap<String, FeatureValue>;

pub const TRANSACTION_COUNT_KEY: &str = "transaction_count";

/// Convert calculator output into portable values and append the
/// retained transaction count.
pub fn sanitize(
    features: impl IntoIterator<Item = (&'static str, RawFeature)>,
    transaction_count: usize,
) -> FeatureMap {
    let mut out: FeatureMap = features
        .into_iter()
        .map(|(name, value)| (name.to_string(), portable(value)))
        .collect();
    out.insert(
        TRANSACTION_COUNT_KEY.to_string(),
        portable(RawFeature::Count(transaction_count)),
    );
    out
}

fn portable(value: RawFeature) -> FeatureValue {
    match value {
        RawFeature::Count(n) => FeatureValue::Integer(i64::try_from(n).unwrap_or(i64::MAX)),
        // JSON has no NaN/inf
        RawFeature::Number(x) if !x.is_finite() => FeatureValue::Text(x.to_string()),
        RawFeature::Number(x) => FeatureValue::Float(x),
        RawFeature::Text(s) => FeatureValue::Text(s),
        RawFeature::Labels(items) => FeatureValue::List(items),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_every_shape() {
        let map = sanitize(
            vec![
                ("count", RawFeature::Count(3)),
                ("usd", RawFeature::Number(12.5)),
                ("label", RawFeature::Text("uniswap".into())),
                ("tags", RawFeature::Labels(vec!["a".into(), "b".into()])),
                ("broken", RawFeature::Number(f64::INFINITY)),
            ],
            7,
        );
        assert_eq!(map["count"], FeatureValue::Integer(3));
        assert_eq!(map["usd"], FeatureValue::Float(12.5));
        assert_eq!(map["label"], FeatureValue::Text("uniswap".into()));
        assert_eq!(map["tags"], FeatureValue::List(vec!["a".into(), "b".into()]));
        assert_eq!(map["broken"], FeatureValue::Text("inf".into()));
        assert_eq!(map[TRANSACTION_COUNT_KEY], FeatureValue::Integer(7));
    }

    #[test]
    fn survives_json_round_trip() {
        let map = sanitize(
            vec![
                ("whole_float", RawFeature::Number(1000.0)),
                ("fraction", RawFeature::Number(0.125)),
                ("n", RawFeature::Count(0)),
                ("tags", RawFeature::Labels(vec![])),
            ],
            1,
        );
        let json = serde_json::to_string(&map).unwrap();
        let back: FeatureMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }
}
