//! SOAP 1.2 envelope wrapping and unwrapping.

use crate::config::{SOAP_ENV_NAMESPACE, SOAP_ENV_PREFIX};
use crate::xml::Element;

/// Wrap `payload` as `env:Envelope > env:Body > payload`.
pub fn soap_embed(payload: Element) -> Element {
    let body = Element::qualified(SOAP_ENV_PREFIX, SOAP_ENV_NAMESPACE, "Body").with_child(payload);
    Element::qualified(SOAP_ENV_PREFIX, SOAP_ENV_NAMESPACE, "Envelope").with_child(body)
}

/// Return the first element inside the envelope's `Body`.
///
/// The body is looked up in the envelope's own namespace, so SOAP 1.1
/// envelopes unwrap as well. Gives the envelope back when there is no body or
/// the body has no element content.
pub fn soap_unembed(envelope: Element) -> Result<Element, Element> {
    let namespace = envelope.namespace();
    let first = envelope
        .child_elements()
        .find(|child| child.local_name() == "Body" && child.namespace() == namespace)
        .and_then(|body| body.child_elements().next())
        .cloned();

    first.ok_or(envelope)
}
