//! Example of modifying a QRIS payload in both modes

use qris_tlv::{legacy_patch, parse, verify_crc, Directive, Mode, Processor, Record};

fn main() -> anyhow::Result<()> {
    println!("=== QRIS Payload Example ===\n");

    let payload = "00020101021126690014ID.CO.QRIS.WWW01189360091530000001230218ID10200211112223330303UMI51440014ID.CO.QRIS.WWW0215ID10200211112220303UMI5204411153033605802ID5920KEMENHUB SBY REGULER6008SURABAYA61056011163047B91";

    println!("Fields:");
    for field in parse(payload)?.iter() {
        println!("  {} {:02} {}", field.tag, field.length(), field.value);
    }

    // Tag-aware: make the QR dynamic and set the amount from the record
    let directives = Directive::parse_content("+|01|02|12\n+|54||$tarif\n")?;
    let record = Record::new().with("tarif", "6200");
    let processor = Processor::new(Mode::Tlv { directives });
    let outcome = processor.process(payload, Some(&record))?;

    println!("\nTLV mode:\n{}", outcome.payload);
    for diagnostic in &outcome.diagnostics {
        println!("  warning: {}", diagnostic);
    }

    // Fixed offset, for the older layout only
    let legacy = legacy_patch(payload, "6200", true);
    println!("\nLegacy mode:\n{}", legacy);

    assert_eq!(outcome.payload, legacy);
    assert_eq!(verify_crc(&legacy), Ok(true));
    println!("\nBoth modes agree on this layout.");

    Ok(())
}
