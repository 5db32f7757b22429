#![allow(dead_code)]

use xtract::{ExecutionResult, ExtractXpath, MemoryContext, MessageContext, Properties};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub const TX_NAMESPACE: &str = "https://example.com/20190122/tx";
pub const ENTITIES_NAMESPACE: &str = "https://example.com/20190122/entities";

/// A purchase order with a prefixed document element and a default namespace
/// for everything below it.
pub const ORDER_XML: &str = r#"<?xml version='1.0' encoding='UTF-8'?>
<tx:order xmlns:tx='https://example.com/20190122/tx' xmlns='https://example.com/20190122/entities'>        <customer customerNumber='0815A4711'>
                <name>Michael Sonntag</name>
                <address>
                        <street>Altenbergerstr. 69</street>
                        <ZIP>4040</ZIP>
                        <city>Linz</city>
                        <province>Upper Austria</province>
                        <country>Austria</country>
                        <email>sonntag@fim.uni-linz.ac.at</email>
                        <phone>+43(732)2468-9330</phone>
                        <fax>+43(732)2468-8599</fax>
                </address>
        </customer>
        <articles>
                <line>
                        <quantity unit='piece'>30</quantity>
                        <product productNumber='9907'>XML editing widget</product>
                        <price currency='EUR'>0.10</price>
                </line>
                <line>
                        <quantity unit='piece'>1</quantity>
                        <product productNumber='666'>Course supervisor handbook</product>
                        <price currency='EUR'>999.89</price>
                </line>
                <line>
                        <quantity unit='litre'>5</quantity>
                        <product productNumber='007'>Super juice</product>
                        <price currency='HUF'>500</price>
                </line>
        </articles>
        <delivery>
                <deliveryaddress>
                        <name>Michael Sonntag</name>
                        <address>
                                <street>Auf der Wies 18</street>
                                <ZIP>4040</ZIP>
                                <city>Linz</city>
                                <province>Upper Austria</province>
                                <country>Austria</country>
                                <phone>+43(676)3965166</phone>
                        </address>
                </deliveryaddress>
                <options>
                        <insurance>none</insurance>
                        <collection>1</collection>
                        <service>post</service>
                </options>
        </delivery>
        <payment type='CC'>
                <creditcard issuer='Mastercard'>
                        <nameOnCard>Mag. Dipl.-Ing. Dr. Michael Sonntag</nameOnCard>
                        <number>5201 2345 6789 0123</number>
                        <expiryDate>2006-04-30</expiryDate>
                </creditcard>
        </payment>
</tx:order>
"#;

/// A document with an XML 1.1 declaration.
pub const TASK_XML: &str = r#"<?xml version="1.1"?><Task> 
  <Triggers>
    <EventTrigger>
      <ExecutionTimeLimit>123</ExecutionTimeLimit>
    </EventTrigger>
  </Triggers></Task>"#;

/// A context holding `xml` in `message.content`.
pub fn context_with(xml: &str) -> MemoryContext {
    MemoryContext::new().with_variable("message.content", xml)
}

/// Properties reading from `message.content`, with both order namespaces bound.
pub fn order_properties() -> Properties {
    Properties::new()
        .with("source", "message.content")
        .with("xmlns:tx", TX_NAMESPACE)
        .with("xmlns:e", ENTITIES_NAMESPACE)
}

pub fn run(properties: Properties, ctx: &mut MemoryContext) -> ExecutionResult {
    ExtractXpath::new(properties).execute(ctx)
}

/// Asserts that no failure variable was written.
pub fn assert_no_failure(ctx: &MemoryContext) {
    assert_eq!(ctx.variable("xpath_error"), None, "xpath_error");
    assert_eq!(ctx.variable("xpath_exception"), None, "xpath_exception");
    assert_eq!(ctx.variable("xpath_stacktrace"), None, "xpath_stacktrace");
}
