//! JSON form of [`RegionPayload`].

use markscan_calibrate::RegionPayload;

use crate::ExportError;

/// Serialize a payload, optionally pretty-printed for download.
///
/// # Errors
///
/// Returns [`ExportError::Json`] if serialization fails.
pub fn to_json(payload: &RegionPayload, pretty: bool) -> Result<String, ExportError> {
    let json = if pretty {
        serde_json::to_string_pretty(payload)?
    } else {
        serde_json::to_string(payload)?
    };
    Ok(json)
}

/// Parse a payload and check the region-set rules.
///
/// # Errors
///
/// Returns [`ExportError::Json`] for malformed JSON and
/// [`ExportError::InvalidPayload`] when the regions are empty or do not
/// hold exactly one multiple-choice region.
pub fn from_json(json: &str) -> Result<RegionPayload, ExportError> {
    let payload: RegionPayload = serde_json::from_str(json)?;
    payload.check()?;
    Ok(payload)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use markscan_calibrate::{CalibrateError, RegionType};

    use super::*;

    const SAVED: &str = r#"{
        "image_width": 1000,
        "image_height": 800,
        "regions": [
            {"question_id": "all", "type": "mcq", "x": 100, "y": 100, "width": 200, "height": 50},
            {"question_id": "1", "type": "written", "x": 80, "y": 250, "width": 520, "height": 90}
        ]
    }"#;

    #[test]
    fn parses_saved_payload() {
        let p = from_json(SAVED).unwrap();
        assert_eq!(p.image_width, 1000);
        assert_eq!(p.regions[0].region_type, RegionType::Mcq);
        assert_eq!(p.regions[1].question_id, "1");
    }

    #[test]
    fn compact_and_pretty_parse_identically() {
        let p = from_json(SAVED).unwrap();
        let compact = to_json(&p, false).unwrap();
        let pretty = to_json(&p, true).unwrap();
        assert!(!compact.contains('\n'));
        assert!(pretty.contains('\n'));
        assert_eq!(from_json(&compact).unwrap(), from_json(&pretty).unwrap());
    }

    #[test]
    fn rejects_payload_without_mcq() {
        let json = r#"{"image_width": 10, "image_height": 10, "regions": [
            {"question_id": "1", "type": "written", "x": 0, "y": 0, "width": 5, "height": 5}
        ]}"#;
        assert!(matches!(
            from_json(json),
            Err(ExportError::InvalidPayload(CalibrateError::MissingMcq))
        ));
    }

    #[test]
    fn rejects_unknown_region_type() {
        let json = r#"{"image_width": 10, "image_height": 10, "regions": [
            {"question_id": "all", "type": "essay", "x": 0, "y": 0, "width": 5, "height": 5}
        ]}"#;
        assert!(matches!(from_json(json), Err(ExportError::Json(_))));
    }
}
