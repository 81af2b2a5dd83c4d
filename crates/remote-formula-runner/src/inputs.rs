//! Input collection for a selected formula.

use std::net::{IpAddr, Ipv4Addr, UdpSocket};

use remote_formula_core::{FormulaDescriptor, InputKind, InputSpec, InputValue, PromptError, Prompter};

/// Name of the input carrying the caller's local address.
pub const ORIGIN_INPUT: &str = "IPAddr";

/// Ask for every declared input of `formula`, in declared order.
///
/// Credential references are not asked for; they are sent without a value.
///
/// # Errors
/// Returns error if the prompter fails.
pub fn collect_inputs(
    formula: &FormulaDescriptor,
    prompter: &dyn Prompter,
) -> Result<Vec<InputValue>, PromptError> {
    formula
        .inputs
        .iter()
        .map(|spec| {
            Ok(InputValue {
                name: spec.name.clone(),
                kind: spec.kind.clone(),
                value: collect_one(spec, prompter)?,
            })
        })
        .collect()
}

fn collect_one(spec: &InputSpec, prompter: &dyn Prompter) -> Result<Option<String>, PromptError> {
    let value = match &spec.kind {
        InputKind::Credential(_) => return Ok(None),
        InputKind::Boolean => prompter.confirm(&spec.label)?.to_string(),
        InputKind::Password => prompter.password(&spec.label)?,
        InputKind::Text | InputKind::Other(_) => {
            if let Some(choices) = spec.choices() {
                prompter.select(&spec.label, choices)?
            } else {
                let default = spec.default_value();
                let answer = prompter.text(&spec.label, default.is_none())?;
                match default {
                    Some(default) if answer.is_empty() => default.to_string(),
                    _ => answer,
                }
            }
        }
    };
    Ok(Some(value))
}

/// Input tagging the submission with the caller's address.
#[must_use]
pub fn origin_input(address: IpAddr) -> InputValue {
    InputValue::new(ORIGIN_INPUT, InputKind::Text, address.to_string())
}

/// Local address the OS would use for outbound traffic.
///
/// Connecting a UDP socket only selects a route; nothing is sent.
///
/// # Errors
/// Returns error if no route is available.
pub fn local_address() -> std::io::Result<IpAddr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
    socket.connect((Ipv4Addr::new(8, 8, 8, 8), 80))?;
    Ok(socket.local_addr()?.ip())
}
