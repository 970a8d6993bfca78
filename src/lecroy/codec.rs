use crate::error::ScopeError;
use crate::types::ScalarValue;

/// Prefix the instrument puts in front of a VBS query reply.
pub const RESPONSE_PREFIX: &str = "VBS ";

/// One outgoing instruction in the instrument's remote-scripting syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    text: String,
    expects_reply: bool,
}

impl CommandLine {
    fn statement(body: String) -> Self {
        Self {
            text: format!("VBS '{body}'"),
            expects_reply: false,
        }
    }

    fn returning(expression: String) -> Self {
        Self {
            text: format!("VBS? 'return = {expression}'"),
            expects_reply: true,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Whether the instrument answers this line with exactly one reply line.
    pub fn expects_reply(&self) -> bool {
        self.expects_reply
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.text.into_bytes()
    }
}

/// Stateless translation between host values and VBS command text.
pub struct Codec;

impl Codec {
    /// Render a value as a VBS literal.
    ///
    /// Text is quoted without escaping, so text containing `"` is rejected, as
    /// are non-finite reals which have no VBS literal.
    pub fn encode_scalar(value: &ScalarValue) -> Result<String, ScopeError> {
        match value {
            ScalarValue::Text(text) => {
                if text.contains('"') {
                    return Err(ScopeError::InvalidValue(format!(
                        "Text value may not contain a double quote: {text}"
                    )));
                }
                Ok(format!("\"{text}\""))
            }
            ScalarValue::Integer(n) => Ok(n.to_string()),
            ScalarValue::Real(x) => {
                if !x.is_finite() {
                    return Err(ScopeError::InvalidValue(format!(
                        "Real value must be finite, got {x}"
                    )));
                }
                // Debug keeps the decimal point (`1.0`) and uses exponents for
                // very small or large magnitudes (`1e-12`).
                Ok(format!("{x:?}"))
            }
            ScalarValue::Boolean(true) => Ok("True".to_string()),
            ScalarValue::Boolean(false) => Ok("False".to_string()),
        }
    }

    pub fn build_action(statement: &str) -> CommandLine {
        CommandLine::statement(statement.to_string())
    }

    pub fn build_query(path: &str) -> CommandLine {
        CommandLine::returning(path.to_string())
    }

    pub fn build_assignment(path: &str, value: &ScalarValue) -> Result<CommandLine, ScopeError> {
        let literal = Self::encode_scalar(value)?;
        Ok(CommandLine::statement(format!("{path} = {literal}")))
    }

    pub fn build_method_call(path: &str, args: &[ScalarValue]) -> Result<CommandLine, ScopeError> {
        let encoded = args
            .iter()
            .map(Self::encode_scalar)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CommandLine::returning(format!(
            "{path}({})",
            encoded.join(", ")
        )))
    }

    /// Strip the query acknowledgement prefix from a reply line.
    ///
    /// Must be applied exactly once per reply: a payload that itself starts
    /// with `VBS ` would be stripped again.
    pub fn unpack_response(line: &str) -> &str {
        match line.get(..RESPONSE_PREFIX.len()) {
            Some(head) if head.eq_ignore_ascii_case(RESPONSE_PREFIX) => {
                &line[RESPONSE_PREFIX.len()..]
            }
            _ => line,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_text_is_quoted() {
        for text in ["", "C1", "app.Acquisition", "with space", "ünïcode"] {
            let encoded = Codec::encode_scalar(&ScalarValue::from(text)).unwrap();
            assert_eq!(encoded, format!("\"{text}\""));
        }
    }

    #[test]
    fn test_encode_text_rejects_quote() {
        let result = Codec::encode_scalar(&ScalarValue::from("say \"hi\""));
        assert!(matches!(result, Err(ScopeError::InvalidValue(_))));
    }

    #[test]
    fn test_encode_numbers_parse_back() {
        for n in [0i64, 1, -1, 42, i64::MAX, i64::MIN] {
            let encoded = Codec::encode_scalar(&ScalarValue::Integer(n)).unwrap();
            assert_eq!(encoded.parse::<i64>().unwrap(), n);
        }
        for x in [0.0f64, 0.1, 0.002, -3.5, 1e-12, 6.02e23, f64::MAX] {
            let encoded = Codec::encode_scalar(&ScalarValue::Real(x)).unwrap();
            assert_eq!(encoded.parse::<f64>().unwrap(), x);
        }
    }

    #[test]
    fn test_encode_real_keeps_real_form() {
        let cases = [
            (1.0, "1.0"),
            (0.1, "0.1"),
            (-0.002, "-0.002"),
            (1e-12, "1e-12"),
            (f64::MAX, "1.7976931348623157e308"),
        ];
        for (x, expected) in cases {
            assert_eq!(Codec::encode_scalar(&ScalarValue::Real(x)).unwrap(), expected);
        }
        assert_eq!(Codec::encode_scalar(&ScalarValue::Integer(1)).unwrap(), "1");
    }

    #[test]
    fn test_encode_non_finite_rejected() {
        assert!(Codec::encode_scalar(&ScalarValue::Real(f64::NAN)).is_err());
        assert!(Codec::encode_scalar(&ScalarValue::Real(f64::INFINITY)).is_err());
    }

    #[test]
    fn test_encode_booleans() {
        assert_eq!(Codec::encode_scalar(&true.into()).unwrap(), "True");
        assert_eq!(Codec::encode_scalar(&false.into()).unwrap(), "False");
    }

    #[test]
    fn test_build_lines() {
        let action = Codec::build_action("app.Measure.ClearSweeps");
        assert_eq!(action.as_str(), "VBS 'app.Measure.ClearSweeps'");
        assert!(!action.expects_reply());

        let query = Codec::build_query("app.SerialNumber");
        assert_eq!(query.as_str(), "VBS? 'return = app.SerialNumber'");
        assert!(query.expects_reply());

        let assignment =
            Codec::build_assignment("app.Acquisition.Horizontal.horscale", &0.002.into()).unwrap();
        assert_eq!(
            assignment.as_str(),
            "VBS 'app.Acquisition.Horizontal.horscale = 0.002'"
        );
        assert!(!assignment.expects_reply());

        let text_assignment =
            Codec::build_assignment("app.Acquisition.TriggerMode", &"Single".into()).unwrap();
        assert_eq!(
            text_assignment.as_str(),
            "VBS 'app.Acquisition.TriggerMode = \"Single\"'"
        );
    }

    #[test]
    fn test_build_method_call() {
        let call = Codec::build_method_call("app.Acquisition.acquire", &[0.1.into(), false.into()])
            .unwrap();
        assert_eq!(
            call.as_str(),
            "VBS? 'return = app.Acquisition.acquire(0.1, False)'"
        );
        assert!(call.expects_reply());

        let empty = Codec::build_method_call("app.ClearSweeps", &[]).unwrap();
        assert_eq!(empty.as_str(), "VBS? 'return = app.ClearSweeps()'");
    }

    #[test]
    fn test_method_call_rejects_bad_argument() {
        let result = Codec::build_method_call("app.Foo", &[1.into(), "a\"b".into()]);
        assert!(result.is_err());
    }

    #[test]
    fn test_unpack_response() {
        assert_eq!(Codec::unpack_response("VBS SN12345"), "SN12345");
        assert_eq!(Codec::unpack_response("vbs 1"), "1");
        assert_eq!(Codec::unpack_response("VbS  padded "), " padded ");
        assert_eq!(Codec::unpack_response("VBS "), "");
        assert_eq!(Codec::unpack_response("VBS"), "VBS");
        assert_eq!(Codec::unpack_response("VBSX1"), "VBSX1");
        assert_eq!(Codec::unpack_response("1"), "1");
        assert_eq!(Codec::unpack_response(""), "");
        assert_eq!(Codec::unpack_response("*OPC 1"), "*OPC 1");
    }

    #[test]
    fn test_unpack_strips_only_once() {
        assert_eq!(Codec::unpack_response("VBS VBS nested"), "VBS nested");
    }

    #[test]
    fn test_unpack_non_ascii_boundary() {
        // A multi-byte character straddling byte 4 is not the prefix.
        assert_eq!(Codec::unpack_response("VBSé rest"), "VBSé rest");
    }
}
