//! CSW 2.0.2 request builders.

use crate::config::{CSW_NAMESPACE, CSW_VERSION};
use crate::csw::ElementSetName;
use crate::transport::{Method, XmlRequest};
use crate::xml::Element;

const CSW_PREFIX: &str = "csw";
const RECORD_TYPE: &str = "csw:Record";

/// One page of a CSW `GetRecords` query over Dublin Core records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetRecordsRequest {
    pub element_set: ElementSetName,
    /// 1-based index of the first record.
    pub start_position: u64,
    pub max_records: u32,
}

impl GetRecordsRequest {
    pub fn new(element_set: ElementSetName, start_position: u64, max_records: u32) -> Self {
        Self {
            element_set,
            start_position,
            max_records,
        }
    }

    /// The request as a POST body.
    ///
    /// # Examples
    /// ```
    /// use catalog_harvester::csw::{ElementSetName, GetRecordsRequest};
    /// use catalog_harvester::xml::to_xml_string;
    ///
    /// let xml = to_xml_string(&GetRecordsRequest::new(ElementSetName::Brief, 1, 10).to_element());
    /// assert!(xml.contains(r#"startPosition="1""#));
    /// assert!(xml.contains("<csw:ElementSetName>brief</csw:ElementSetName>"));
    /// ```
    pub fn to_element(&self) -> Element {
        let query = csw_element("Query")
            .with_attribute("typeNames", RECORD_TYPE)
            .with_child(csw_element("ElementSetName").with_text(self.element_set.as_str()));

        csw_element("GetRecords")
            .with_attribute("service", "CSW")
            .with_attribute("version", CSW_VERSION)
            .with_attribute("resultType", "results")
            .with_attribute("startPosition", self.start_position.to_string())
            .with_attribute("maxRecords", self.max_records.to_string())
            .with_attribute("outputSchema", CSW_NAMESPACE)
            .with_child(query)
    }

    /// The request as key/value parameters, in the order they are sent.
    pub fn to_params(&self) -> Vec<(String, String)> {
        [
            ("service", "CSW".to_string()),
            ("version", CSW_VERSION.to_string()),
            ("request", "GetRecords".to_string()),
            ("namespace", format!("xmlns({CSW_PREFIX}={CSW_NAMESPACE})")),
            ("typeNames", RECORD_TYPE.to_string()),
            ("resultType", "results".to_string()),
            ("elementSetName", self.element_set.to_string()),
            ("outputSchema", CSW_NAMESPACE.to_string()),
            ("startPosition", self.start_position.to_string()),
            ("maxRecords", self.max_records.to_string()),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
    }

    /// Load this request into `client` using `method`.
    pub fn apply(&self, client: &mut XmlRequest, method: Method) {
        self.apply_with(client, method, &[]);
    }

    /// Like [`apply`](Self::apply), sending `base` ahead of the GetRecords
    /// parameters on GET. Pairs in `base` named like a GetRecords parameter
    /// (ignoring case) are dropped.
    pub fn apply_with(&self, client: &mut XmlRequest, method: Method, base: &[(String, String)]) {
        client.clear_params();
        match method {
            Method::Post => client.set_request(self.to_element()),
            Method::Get => {
                let params = self.to_params();
                let base = base
                    .iter()
                    .filter(|(name, _)| !params.iter().any(|(p, _)| p.eq_ignore_ascii_case(name)))
                    .cloned();
                for (name, value) in base.chain(params.iter().cloned()) {
                    client.add_param(name, value);
                }
            }
        }
    }
}

/// A `GetCapabilities` POST body.
pub fn get_capabilities_element() -> Element {
    csw_element("GetCapabilities").with_attribute("service", "CSW")
}

/// Load a `GetCapabilities` request into `client` using `method`.
pub fn apply_get_capabilities(client: &mut XmlRequest, method: Method) {
    client.clear_params();
    match method {
        Method::Post => client.set_request(get_capabilities_element()),
        Method::Get => {
            client.add_param("service", "CSW");
            client.add_param("request", "GetCapabilities");
            client.add_param("acceptVersions", CSW_VERSION);
        }
    }
}

fn csw_element(local: &str) -> Element {
    Element::qualified(CSW_PREFIX, CSW_NAMESPACE, local)
}
