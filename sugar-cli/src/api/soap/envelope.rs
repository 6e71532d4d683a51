//! SOAP 1.1 RPC/encoded request envelopes

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::api::error::{ClientError, Result};
use crate::api::models::{NameValue, SetRelationshipValue, UserAuth};

/// Target namespace of the SugarCRM service
pub const SUGAR_NAMESPACE: &str = "http://www.sugarcrm.com/sugarcrm";

const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
const SOAP_ENC_NS: &str = "http://schemas.xmlsoap.org/soap/encoding/";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema";

/// A typed argument of an RPC call
#[derive(Debug, Clone, PartialEq)]
enum Param {
    String(String),
    Int(i32),
    StringArray(Vec<String>),
    NameValues(Vec<NameValue>),
    /// Complex type name plus its string members in order
    Struct(&'static str, Vec<(&'static str, String)>),
}

/// An RPC request under construction
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    operation: &'static str,
    params: Vec<(&'static str, Param)>,
}

impl Envelope {
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            params: Vec::new(),
        }
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// `SOAPAction` header value for this operation
    pub fn soap_action(&self) -> String {
        format!("\"{}/{}\"", SUGAR_NAMESPACE, self.operation)
    }

    pub fn string(mut self, name: &'static str, value: &str) -> Self {
        self.params.push((name, Param::String(value.to_string())));
        self
    }

    pub fn int(mut self, name: &'static str, value: i32) -> Self {
        self.params.push((name, Param::Int(value)));
        self
    }

    pub fn string_array(mut self, name: &'static str, values: &[String]) -> Self {
        self.params.push((name, Param::StringArray(values.to_vec())));
        self
    }

    pub fn name_values(mut self, name: &'static str, values: &[NameValue]) -> Self {
        self.params.push((name, Param::NameValues(values.to_vec())));
        self
    }

    pub fn user_auth(mut self, name: &'static str, auth: &UserAuth) -> Self {
        self.params.push((
            name,
            Param::Struct(
                "user_auth",
                vec![
                    ("user_name", auth.user_name.clone()),
                    ("password", auth.password.clone()),
                    ("version", auth.version.clone()),
                ],
            ),
        ));
        self
    }

    pub fn relationship(mut self, name: &'static str, value: &SetRelationshipValue) -> Self {
        self.params.push((
            name,
            Param::Struct(
                "set_relationship_value",
                vec![
                    ("module1", value.module1.clone()),
                    ("module1_id", value.module1_id.clone()),
                    ("module2", value.module2.clone()),
                    ("module2_id", value.module2_id.clone()),
                ],
            ),
        ));
        self
    }

    /// Serialize the envelope to an XML document
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::new());

        emit(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        emit(
            &mut writer,
            Event::Start(BytesStart::new("soap:Envelope").with_attributes([
                ("xmlns:soap", SOAP_ENV_NS),
                ("xmlns:soapenc", SOAP_ENC_NS),
                ("xmlns:xsi", XSI_NS),
                ("xmlns:xsd", XSD_NS),
                ("xmlns:tns", SUGAR_NAMESPACE),
            ])),
        )?;
        emit(
            &mut writer,
            Event::Start(
                BytesStart::new("soap:Body").with_attributes([("soap:encodingStyle", SOAP_ENC_NS)]),
            ),
        )?;

        let call = format!("tns:{}", self.operation);
        emit(&mut writer, Event::Start(BytesStart::new(call.as_str())))?;
        for (name, param) in &self.params {
            write_param(&mut writer, name, param)?;
        }
        emit(&mut writer, Event::End(BytesEnd::new(call.as_str())))?;

        emit(&mut writer, Event::End(BytesEnd::new("soap:Body")))?;
        emit(&mut writer, Event::End(BytesEnd::new("soap:Envelope")))?;

        String::from_utf8(writer.into_inner())
            .map_err(|e| ClientError::Malformed(format!("envelope is not UTF-8: {e}")))
    }
}

fn write_param(writer: &mut Writer<Vec<u8>>, name: &str, param: &Param) -> Result<()> {
    match param {
        Param::String(value) => write_scalar(writer, name, "xsd:string", value),
        Param::Int(value) => write_scalar(writer, name, "xsd:int", &value.to_string()),
        Param::StringArray(values) => {
            let array_type = format!("xsd:string[{}]", values.len());
            write_array_start(writer, name, &array_type)?;
            for value in values {
                write_scalar(writer, "item", "xsd:string", value)?;
            }
            emit(writer, Event::End(BytesEnd::new(name)))
        }
        Param::NameValues(values) => {
            let array_type = format!("tns:name_value[{}]", values.len());
            write_array_start(writer, name, &array_type)?;
            for pair in values {
                write_struct(
                    writer,
                    "item",
                    "name_value",
                    &[("name", pair.name.as_str()), ("value", pair.value.as_str())],
                )?;
            }
            emit(writer, Event::End(BytesEnd::new(name)))
        }
        Param::Struct(type_name, members) => {
            let members: Vec<(&str, &str)> =
                members.iter().map(|(k, v)| (*k, v.as_str())).collect();
            write_struct(writer, name, type_name, &members)
        }
    }
}

fn write_scalar(writer: &mut Writer<Vec<u8>>, name: &str, xsi_type: &str, value: &str) -> Result<()> {
    emit(
        writer,
        Event::Start(BytesStart::new(name).with_attributes([("xsi:type", xsi_type)])),
    )?;
    emit(writer, Event::Text(BytesText::new(value)))?;
    emit(writer, Event::End(BytesEnd::new(name)))
}

fn write_struct(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    type_name: &str,
    members: &[(&str, &str)],
) -> Result<()> {
    let xsi_type = format!("tns:{type_name}");
    emit(
        writer,
        Event::Start(BytesStart::new(name).with_attributes([("xsi:type", xsi_type.as_str())])),
    )?;
    for (member, value) in members {
        write_scalar(writer, member, "xsd:string", value)?;
    }
    emit(writer, Event::End(BytesEnd::new(name)))
}

fn write_array_start(writer: &mut Writer<Vec<u8>>, name: &str, array_type: &str) -> Result<()> {
    emit(
        writer,
        Event::Start(BytesStart::new(name).with_attributes([
            ("xsi:type", "soapenc:Array"),
            ("soapenc:arrayType", array_type),
        ])),
    )
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| ClientError::Malformed(format!("failed to write envelope: {e}")))
}
