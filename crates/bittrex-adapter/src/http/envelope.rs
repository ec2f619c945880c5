/*
[INPUT]:  Raw exchange payloads ({success, message, result} envelope)
[OUTPUT]: Uniform Result values - typed success or structured failure
[POS]:    HTTP layer - response normalization
[UPDATE]: When the exchange envelope shape changes
*/

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::http::error::{BittrexError, Result};

/// Map an exchange payload into a uniform result.
///
/// Total over every input: an explicit error indicator (`success: false`)
/// becomes an `Exchange` failure carrying the exchange-reported message; a
/// payload with no error indicator and a present `result` field decodes
/// into `T` (a `null` result is well-formed when `T` is nullable); a
/// payload with neither is `MalformedResponse`. Decode mismatches are
/// `MalformedResponse` as well. Pure - no I/O, no panics.
pub fn normalize<T: DeserializeOwned>(payload: Value) -> Result<T> {
    let Value::Object(mut map) = payload else {
        return Err(BittrexError::malformed("payload is not a JSON object"));
    };

    if let Some(false) = map.get("success").and_then(Value::as_bool) {
        let message = map
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .unwrap_or("exchange reported failure without a message")
            .to_string();
        return Err(BittrexError::Exchange {
            code: None,
            message,
        });
    }

    match map.remove("result") {
        Some(result) => serde_json::from_value(result)
            .map_err(|err| BittrexError::malformed(format!("result field did not decode: {err}"))),
        None => Err(BittrexError::malformed(
            "payload carries neither an error indicator nor a result field",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PlacedOrder;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn success_with_result_decodes_into_target_type() {
        let payload = json!({
            "success": true,
            "message": "",
            "result": { "uuid": "614c34e4-8d71-11e3-94b5-425861b86ab6" }
        });

        let placed: PlacedOrder = normalize(payload).expect("should decode");
        assert_eq!(placed.uuid, "614c34e4-8d71-11e3-94b5-425861b86ab6");
    }

    #[test]
    fn explicit_failure_carries_the_exchange_message() {
        let payload = json!({
            "success": false,
            "message": "INSUFFICIENT_FUNDS",
            "result": null
        });

        let err = normalize::<PlacedOrder>(payload).expect_err("should fail");
        match err {
            BittrexError::Exchange { message, code } => {
                assert_eq!(message, "INSUFFICIENT_FUNDS");
                assert_eq!(code, None);
            }
            other => panic!("expected Exchange, got {other:?}"),
        }
    }

    #[test]
    fn null_result_is_well_formed_for_nullable_targets() {
        let payload = json!({ "success": true, "message": "", "result": null });

        let ack: Option<Value> = normalize(payload).expect("null result should decode");
        assert!(ack.is_none());
    }

    #[test]
    fn neither_indicator_nor_result_is_malformed() {
        let payload = json!({ "message": "hello" });

        let err = normalize::<Value>(payload).expect_err("should fail");
        assert!(matches!(err, BittrexError::MalformedResponse { .. }));
    }

    #[rstest]
    #[case(json!([1, 2, 3]))]
    #[case(json!("plain string"))]
    #[case(json!(42))]
    #[case(json!(null))]
    fn non_object_payloads_are_malformed(#[case] payload: Value) {
        let err = normalize::<Value>(payload).expect_err("should fail");
        assert!(matches!(err, BittrexError::MalformedResponse { .. }));
    }

    #[test]
    fn decode_mismatch_is_malformed_not_a_panic() {
        let payload = json!({ "success": true, "result": { "unexpected": true } });

        let err = normalize::<PlacedOrder>(payload).expect_err("should fail");
        assert!(matches!(err, BittrexError::MalformedResponse { .. }));
    }

    #[test]
    fn mapping_is_deterministic_across_calls() {
        let payload = json!({ "success": false, "message": "APIKEY_INVALID" });

        for _ in 0..3 {
            let err = normalize::<Value>(payload.clone()).expect_err("should fail");
            assert!(matches!(err, BittrexError::Exchange { .. }));
        }
    }
}
