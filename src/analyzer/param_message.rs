//! control messages the presentation layer sends into the engine
//!
//! A message is a small JSON object: a numeric param id plus up to two
//! float values.  Sliders in a UI (wire length, detection band) map onto
//! these without the UI knowing anything about the pipeline internals.
use serde_json::json;
use simple_error::bail;
use std::fmt;

use crate::common::box_error::BoxError;

#[derive(ToPrimitive, FromPrimitive, PartialEq, Debug, Clone, Copy)]
pub enum AnalyzerParam {
    SetWireLength = 0,
    SetTensionBand,
    SetFrequencyBand,
    SetBandPass,
    Shutdown,
}

pub struct ParamMessage {
    pub param: AnalyzerParam,
    pub fvalue_1: f64,
    pub fvalue_2: f64,
}

impl ParamMessage {
    pub fn new(param: AnalyzerParam, fval1: f64, fval2: f64) -> ParamMessage {
        ParamMessage {
            param,
            fvalue_1: fval1,
            fvalue_2: fval2,
        }
    }

    pub fn as_json(&self) -> serde_json::Value {
        json!({
          "param": num::ToPrimitive::to_i64(&self.param),
          "fValue1": self.fvalue_1,
          "fValue2": self.fvalue_2,
        })
    }

    pub fn from_string(data: &str) -> Result<ParamMessage, BoxError> {
        let raw = serde_json::from_str(data)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &serde_json::Value) -> Result<ParamMessage, BoxError> {
        if !raw["param"].is_i64() {
            bail!("no param in message");
        }
        let code = raw["param"].as_i64().unwrap();
        let param: AnalyzerParam = match num::FromPrimitive::from_i64(code) {
            Some(p) => p,
            None => {
                bail!("unknown param code {}", code);
            }
        };
        let mut msg = ParamMessage::new(param, 0.0, 0.0);
        if raw["fValue1"].is_number() {
            msg.fvalue_1 = raw["fValue1"].as_f64().unwrap();
        }
        if raw["fValue2"].is_number() {
            msg.fvalue_2 = raw["fValue2"].as_f64().unwrap();
        }
        Ok(msg)
    }
}

impl fmt::Display for ParamMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{{ param: {:?}, fval_1: {}, fval_2: {} }}",
            self.param, self.fvalue_1, self.fvalue_2
        )
    }
}

#[cfg(test)]
mod test_param_message {
    use super::*;

    #[test]
    fn can_json() {
        let msg = ParamMessage::new(AnalyzerParam::SetWireLength, 0.185, 0.0);
        assert_eq!(msg.as_json()["param"], 0);
        assert_eq!(msg.as_json()["fValue1"], 0.185);
    }

    #[test]
    fn from_json_string() {
        let data = r#"
        {
            "param": 1,
            "fValue1": 200.0,
            "fValue2": 2500.0
        }"#;
        let msg = ParamMessage::from_string(data).unwrap();
        assert_eq!(msg.param, AnalyzerParam::SetTensionBand);
        assert_eq!(msg.fvalue_1, 200.0);
        assert_eq!(msg.fvalue_2, 2500.0);
    }

    #[test]
    fn rejects_unknown_param() {
        let boom = ParamMessage::from_string(r#"{ "param": 99 }"#);
        assert!(boom.is_err());
    }

    #[test]
    fn rejects_missing_param() {
        let boom = ParamMessage::from_string(r#"{ "fValue1": 1.0 }"#);
        assert!(boom.is_err());
    }
}
