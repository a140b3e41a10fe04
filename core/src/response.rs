//! Interpretation of the Posterous `<rsp stat="...">` envelope.

use tracing::{trace, warn};

use crate::error::ApiError;
use crate::xml::Document;

/// Parse a raw response body.
///
/// `stat="ok"` yields the whole document. `stat="fail"` yields
/// `ApiError::Api` with the `err` element's `code` and `msg`. Any other
/// status, or none at all, is `ApiError::InvalidStatus`.
pub fn parse(raw: &str) -> Result<Document, ApiError> {
    trace!(len = raw.len(), "parsing response body");
    let doc = Document::parse(raw).map_err(ApiError::MalformedResponse)?;

    match doc.root().attr("stat") {
        Some("ok") => Ok(doc),
        Some("fail") => {
            let err = doc
                .root()
                .child("err")
                .ok_or_else(|| ApiError::MalformedResponse("fail response without err element".to_string()))?;
            let code = err.attr("code").unwrap_or_default().to_string();
            let message = err.attr("msg").unwrap_or_default().to_string();
            warn!(%code, %message, "service returned failure");
            Err(ApiError::Api { code, message })
        }
        other => {
            warn!(stat = ?other, "unrecognized response status");
            Err(ApiError::InvalidStatus(other.map(str::to_string)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_returns_whole_document() {
        let doc = parse(r#"<rsp stat="ok"><site id="1"/></rsp>"#).unwrap();
        assert_eq!(doc.root().name(), "rsp");
        assert_eq!(doc.root().attr("stat"), Some("ok"));
        assert_eq!(doc.root().child("site").and_then(|s| s.attr("id")), Some("1"));
    }

    #[test]
    fn fail_carries_code_and_message() {
        let err = parse(r#"<rsp stat="fail"><err code="404" msg="Not found"/></rsp>"#).unwrap_err();
        match err {
            ApiError::Api { code, message } => {
                assert_eq!(code, "404");
                assert_eq!(message, "Not found");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn fail_without_err_element_is_malformed() {
        let err = parse(r#"<rsp stat="fail"/>"#).unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse(_)));
    }

    #[test]
    fn fail_with_partial_err_keeps_what_is_present() {
        let err = parse(r#"<rsp stat="fail"><err code="3001"/></rsp>"#).unwrap_err();
        assert!(matches!(err, ApiError::Api { ref code, ref message } if code == "3001" && message.is_empty()));
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = parse(r#"<rsp stat="weird"/>"#).unwrap_err();
        assert!(matches!(err, ApiError::InvalidStatus(Some(ref s)) if s == "weird"));
    }

    #[test]
    fn missing_status_is_rejected() {
        let err = parse("<rsp><site/></rsp>").unwrap_err();
        assert!(matches!(err, ApiError::InvalidStatus(None)));
    }

    #[test]
    fn status_match_is_exact() {
        let err = parse(r#"<rsp stat="OK"/>"#).unwrap_err();
        assert!(matches!(err, ApiError::InvalidStatus(_)));
    }

    #[test]
    fn non_xml_is_malformed() {
        let err = parse("<html><body>502 Bad Gateway").unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse(_)));
        let err = parse("").unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse(_)));
    }
}
