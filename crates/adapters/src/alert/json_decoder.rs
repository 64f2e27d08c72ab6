use domain::alert::entity::{AlertFieldMapping, AlertProtocol, AlertRecord};
use domain::alert::error::AlertError;
use serde_json::{Map, Value};

/// Decodes newline-delimited JSON alerts into [`AlertRecord`]s.
///
/// Only the object's shape is checked. Every field is optional: a missing
/// source becomes "unknown" downstream, a missing protocol is
/// [`AlertProtocol::Unknown`] and a missing message is empty.
#[derive(Debug, Clone, Default)]
pub struct JsonAlertDecoder {
    mapping: AlertFieldMapping,
}

impl JsonAlertDecoder {
    pub fn new(mapping: AlertFieldMapping) -> Self {
        Self { mapping }
    }

    pub fn mapping(&self) -> &AlertFieldMapping {
        &self.mapping
    }

    pub fn decode(&self, line: &str) -> Result<AlertRecord, AlertError> {
        let raw = line.trim();
        let value: Value =
            serde_json::from_str(raw).map_err(|e| AlertError::Malformed(e.to_string()))?;
        let Value::Object(object) = value else {
            return Err(AlertError::NotAnObject);
        };

        let source = first_field(&object, &self.mapping.source_fields);
        let protocol = first_field(&object, &self.mapping.protocol_fields);
        let message = first_field(&object, &self.mapping.message_fields).unwrap_or_default();

        Ok(AlertRecord::new(
            source,
            AlertProtocol::classify(protocol.as_deref()),
            message,
            raw.to_string(),
        ))
    }
}

/// Value of the first alias that is present and not null.
///
/// Strings are taken as-is; numbers and other scalars use their JSON text.
fn first_field(object: &Map<String, Value>, aliases: &[String]) -> Option<String> {
    aliases
        .iter()
        .filter_map(|key| object.get(key))
        .find(|v| !v.is_null())
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoder() -> JsonAlertDecoder {
        JsonAlertDecoder::default()
    }

    #[test]
    fn decodes_plain_layout() {
        let rec = decoder()
            .decode(r#"{"source_address":"10.0.0.5","protocol":"TCP","message":"SYN attack"}"#)
            .unwrap();
        assert_eq!(rec.source_address.as_deref(), Some("10.0.0.5"));
        assert_eq!(rec.protocol, AlertProtocol::Tcp);
        assert_eq!(rec.message, "SYN attack");
    }

    #[test]
    fn decodes_snort_alert_json_layout() {
        let line = r#"{"seconds":1700000000,"msg":"ICMP flood attack","proto":"ICMP","src_addr":"192.168.1.9","src_port":0}"#;
        let rec = decoder().decode(line).unwrap();
        assert_eq!(rec.source_address.as_deref(), Some("192.168.1.9"));
        assert_eq!(rec.protocol, AlertProtocol::Icmp);
        assert_eq!(rec.message, "ICMP flood attack");
        assert_eq!(rec.raw, line);
    }

    #[test]
    fn missing_fields_are_tolerated() {
        let rec = decoder().decode("{}").unwrap();
        assert!(rec.source_address.is_none());
        assert_eq!(rec.source_or_unknown(), "unknown");
        assert_eq!(rec.protocol, AlertProtocol::Unknown);
        assert!(rec.message.is_empty());
    }

    #[test]
    fn null_alias_falls_through_to_next() {
        let rec = decoder()
            .decode(r#"{"src_ip":null,"src_addr":"10.1.1.1","msg":"x"}"#)
            .unwrap();
        assert_eq!(rec.source_address.as_deref(), Some("10.1.1.1"));
    }

    #[test]
    fn earlier_alias_wins() {
        let rec = decoder()
            .decode(r#"{"source_address":"10.9.9.9","src_ip":"10.0.0.1"}"#)
            .unwrap();
        assert_eq!(rec.source_address.as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn numeric_protocol_is_stringified() {
        let rec = decoder().decode(r#"{"proto":17}"#).unwrap();
        assert_eq!(rec.protocol, AlertProtocol::Other("17".to_string()));
    }

    #[test]
    fn custom_mapping() {
        let mapping = AlertFieldMapping {
            source_fields: vec!["attacker".to_string()],
            protocol_fields: vec!["l4".to_string()],
            message_fields: vec!["text".to_string()],
        };
        let rec = JsonAlertDecoder::new(mapping)
            .decode(r#"{"attacker":"2001:db8::1","l4":"tcp","text":"attack","src_ip":"1.2.3.4"}"#)
            .unwrap();
        assert_eq!(rec.source_address.as_deref(), Some("2001:db8::1"));
        assert_eq!(rec.protocol, AlertProtocol::Tcp);
    }

    #[test]
    fn invalid_json_is_malformed() {
        let err = decoder().decode("{bad json}").unwrap_err();
        assert!(matches!(err, AlertError::Malformed(_)));
    }

    #[test]
    fn non_object_rejected() {
        assert!(matches!(
            decoder().decode("[1,2,3]").unwrap_err(),
            AlertError::NotAnObject
        ));
        assert!(matches!(
            decoder().decode("\"attack\"").unwrap_err(),
            AlertError::NotAnObject
        ));
    }

    #[test]
    fn surrounding_whitespace_trimmed() {
        let rec = decoder().decode("  {\"msg\":\"attack\"}\r\n").unwrap();
        assert_eq!(rec.raw, "{\"msg\":\"attack\"}");
    }
}
