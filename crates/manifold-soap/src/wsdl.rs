// crates/manifold-soap/src/wsdl.rs
//
// Static WSDL 1.1 document served on GET. Describes the document-style
// surface generically: every operation takes the Body's first child
// element and answers with `<{operation}Response>`.

/// Service description returned for `GET /`.
pub const WSDL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<wsdl:definitions name="Manifold"
    targetNamespace="urn:manifold:service"
    xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
    xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap/"
    xmlns:tns="urn:manifold:service"
    xmlns:xsd="http://www.w3.org/2001/XMLSchema">

  <wsdl:types>
    <xsd:schema targetNamespace="urn:manifold:service">
      <xsd:element name="CallRequest" type="xsd:anyType"/>
      <xsd:element name="CallResponse" type="xsd:anyType"/>
    </xsd:schema>
  </wsdl:types>

  <wsdl:message name="CallInput">
    <wsdl:part name="body" element="tns:CallRequest"/>
  </wsdl:message>
  <wsdl:message name="CallOutput">
    <wsdl:part name="body" element="tns:CallResponse"/>
  </wsdl:message>

  <wsdl:portType name="ManifoldPortType">
    <wsdl:operation name="Call">
      <wsdl:input message="tns:CallInput"/>
      <wsdl:output message="tns:CallOutput"/>
    </wsdl:operation>
  </wsdl:portType>

  <wsdl:binding name="ManifoldBinding" type="tns:ManifoldPortType">
    <soap:binding style="document"
        transport="http://schemas.xmlsoap.org/soap/http"/>
    <wsdl:operation name="Call">
      <soap:operation soapAction="urn:manifold:call"/>
      <wsdl:input><soap:body use="literal"/></wsdl:input>
      <wsdl:output><soap:body use="literal"/></wsdl:output>
    </wsdl:operation>
  </wsdl:binding>

  <wsdl:service name="ManifoldService">
    <wsdl:port name="ManifoldPort" binding="tns:ManifoldBinding">
      <soap:address location="http://localhost:8080/"/>
    </wsdl:port>
  </wsdl:service>
</wsdl:definitions>
"#;
