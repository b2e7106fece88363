// crates/manifold-soap/src/envelope.rs
//
// SOAP 1.1 envelope decode/encode. Decoding walks the XML event stream
// with a local-name stack, so namespace prefixes (soap:, tns:, or none)
// do not matter. Response envelopes are assembled as strings, with text
// content escaped.

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::Value;
use thiserror::Error;

use manifold_core::FaultKind;

pub const ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// A decoded SOAP call: the Body's first child element names the
/// operation, its children become named string arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct SoapCall {
    pub operation: String,
    pub args: serde_json::Map<String, Value>,
}

/// Decode failures. Answered directly by the listener with a Client
/// fault; they never reach the dispatcher.
#[derive(Debug, Error, PartialEq)]
pub enum DecodeError {
    #[error("malformed XML: {0}")]
    Malformed(String),

    #[error("SOAP Envelope not found")]
    MissingEnvelope,

    #[error("SOAP Body not found")]
    MissingBody,

    #[error("no operation element in SOAP Body")]
    MissingOperation,
}

/// Parse a request envelope into a `SoapCall`.
pub fn decode_envelope(xml: &str) -> Result<SoapCall, DecodeError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<String> = Vec::new();
    let mut saw_envelope = false;
    let mut saw_body = false;
    let mut operation: Option<String> = None;
    let mut args = serde_json::Map::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let local = local_name(e.name().local_name().as_ref())?;
                enter_element(
                    &stack,
                    &local,
                    &mut saw_envelope,
                    &mut saw_body,
                    &mut operation,
                    &mut args,
                )?;
                stack.push(local);
            }
            Ok(Event::Empty(e)) => {
                let local = local_name(e.name().local_name().as_ref())?;
                enter_element(
                    &stack,
                    &local,
                    &mut saw_envelope,
                    &mut saw_body,
                    &mut operation,
                    &mut args,
                )?;
            }
            Ok(Event::End(_)) => {
                stack.pop();
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| DecodeError::Malformed(e.to_string()))?
                    .into_owned();
                record_arg_text(&stack, &operation, &mut args, text);
            }
            Ok(Event::CData(t)) => {
                let text = String::from_utf8_lossy(&t.into_inner()).into_owned();
                record_arg_text(&stack, &operation, &mut args, text);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(DecodeError::Malformed(e.to_string())),
        }
    }

    if !saw_envelope {
        return Err(DecodeError::MissingEnvelope);
    }
    if !saw_body {
        return Err(DecodeError::MissingBody);
    }
    let operation = operation.ok_or(DecodeError::MissingOperation)?;

    Ok(SoapCall { operation, args })
}

/// Classify an element the moment it opens, based on where the stack is.
fn enter_element(
    stack: &[String],
    local: &str,
    saw_envelope: &mut bool,
    saw_body: &mut bool,
    operation: &mut Option<String>,
    args: &mut serde_json::Map<String, Value>,
) -> Result<(), DecodeError> {
    match stack.len() {
        0 => {
            if local != "Envelope" {
                return Err(DecodeError::MissingEnvelope);
            }
            *saw_envelope = true;
        }
        1 => {
            // Header is tolerated and skipped; only Body matters.
            if local == "Body" {
                *saw_body = true;
            }
        }
        2 => {
            if stack[1] == "Body" && operation.is_none() {
                *operation = Some(local.to_string());
            }
        }
        3 => {
            // Direct child of the operation element: a named argument.
            // A placeholder keeps empty elements visible as empty strings.
            if stack[1] == "Body" && Some(&stack[2]) == operation.as_ref() {
                args.insert(local.to_string(), Value::String(String::new()));
            }
        }
        _ => {}
    }
    Ok(())
}

fn record_arg_text(
    stack: &[String],
    operation: &Option<String>,
    args: &mut serde_json::Map<String, Value>,
    text: String,
) {
    if stack.len() == 4
        && stack[1] == "Body"
        && Some(&stack[2]) == operation.as_ref()
    {
        args.insert(stack[3].clone(), Value::String(text));
    }
}

fn local_name(bytes: &[u8]) -> Result<String, DecodeError> {
    std::str::from_utf8(bytes)
        .map(|s| s.to_string())
        .map_err(|e| DecodeError::Malformed(e.to_string()))
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Wrap a successful result into a `<{operation}Response>` element. A JSON
/// object becomes one child element per top-level field; anything else is
/// carried in a single `<result>` element.
pub fn encode_result(operation: &str, result: &Value) -> String {
    let mut inner = String::new();
    match result {
        Value::Object(map) => {
            for (key, value) in map {
                inner.push_str(&element(key, value));
            }
        }
        other => inner.push_str(&element("result", other)),
    }
    wrap_body(&format!(
        "<{op}Response>{inner}</{op}Response>",
        op = operation,
        inner = inner
    ))
}

/// Build a SOAP 1.1 fault envelope.
pub fn encode_fault(faultcode: &str, faultstring: &str) -> String {
    wrap_body(&format!(
        "<soap:Fault><faultcode>{code}</faultcode><faultstring>{msg}</faultstring></soap:Fault>",
        code = faultcode,
        msg = escape(faultstring)
    ))
}

/// Map a protocol-neutral fault kind onto the SOAP 1.1 fault code.
/// Caller-side problems are Client faults, handler faults Server faults.
pub fn fault_code(kind: FaultKind) -> &'static str {
    match kind {
        FaultKind::UnknownOperation | FaultKind::InvalidParams => "soap:Client",
        FaultKind::HandlerFailure => "soap:Server",
    }
}

fn element(name: &str, value: &Value) -> String {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    format!(
        "<{name}>{text}</{name}>",
        name = name,
        text = escape(&text)
    )
}

fn wrap_body(inner: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <soap:Envelope xmlns:soap=\"{ns}\"><soap:Body>{inner}</soap:Body></soap:Envelope>",
        ns = ENVELOPE_NS,
        inner = inner
    )
}
