use wasm_cond::{
    section_record, ErrorKind, Feature, FeatureConjunction, HostFeatures, Module, ModuleBuilder,
    Predicate, SectionKind,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn host(names: &[&str]) -> HostFeatures {
    names.iter().copied().collect()
}

fn require(name: &str) -> Predicate<'_> {
    Predicate::new(vec![FeatureConjunction::new(vec![Feature::require(name)])])
}

#[test]
fn empty_module() -> anyhow::Result<()> {
    let wasm = ModuleBuilder::new().finish();
    let module = Module::parse(&wasm, &host(&[]))?;
    assert!(module.start().is_empty());
    assert_eq!(module.data_count(), None);
    assert!(module.section(SectionKind::Type).is_none());
    Ok(())
}

#[test]
fn bad_header() {
    let err = Module::parse(b"\0masm\x01\0\0\0", &host(&[])).unwrap_err();
    assert_eq!(*err.kind(), ErrorKind::BadHeader);
    let err = Module::parse(b"\0asm\x02\0\0\0", &host(&[])).unwrap_err();
    assert_eq!(*err.kind(), ErrorKind::BadHeader);
}

#[test]
fn repeated_sections_concatenate_in_stream_order() -> anyhow::Result<()> {
    let mut builder = ModuleBuilder::new();
    builder.vector_section(SectionKind::Type, 1, b"ab");
    builder.vector_section(SectionKind::Type, 2, b"cd");
    builder.vector_section(SectionKind::Function, 1, b"e");
    let wasm = builder.finish();
    let module = Module::parse(&wasm, &host(&[]))?;

    let types = module.section(SectionKind::Type).unwrap();
    assert_eq!(types.count(), 3);
    assert_eq!(types.bytes(), b"abcd");
    assert_eq!(module.section(SectionKind::Function).unwrap().count(), 1);
    Ok(())
}

#[test]
fn data_counts_sum() -> anyhow::Result<()> {
    let mut builder = ModuleBuilder::new();
    builder.data_count_section(2);
    builder.data_count_section(0);
    builder.data_count_section(5);
    let wasm = builder.finish();
    let module = Module::parse(&wasm, &host(&[]))?;
    assert_eq!(module.data_count(), Some(7));
    Ok(())
}

#[test]
fn data_count_sum_overflow() {
    let mut builder = ModuleBuilder::new();
    builder.data_count_section(u32::MAX);
    builder.data_count_section(1);
    let err = Module::parse(&builder.finish(), &host(&[])).unwrap_err();
    assert_eq!(*err.kind(), ErrorKind::CountOverflow);
}

#[test]
fn merged_item_count_overflow() {
    let mut builder = ModuleBuilder::new();
    builder.vector_section(SectionKind::Type, u32::MAX, b"");
    builder.vector_section(SectionKind::Type, 1, b"");
    let err = Module::parse(&builder.finish(), &host(&[])).unwrap_err();
    assert_eq!(*err.kind(), ErrorKind::CountOverflow);
}

#[test]
fn start_sections_collect_in_order() -> anyhow::Result<()> {
    let mut builder = ModuleBuilder::new();
    builder.start_section(3);
    builder.start_section(7);
    let wasm = builder.finish();
    let module = Module::parse(&wasm, &host(&[]))?;
    assert_eq!(module.start(), [3, 7]);
    Ok(())
}

#[test]
fn reopened_section_kind_is_rejected() {
    let mut builder = ModuleBuilder::new();
    builder.vector_section(SectionKind::Type, 1, b"a");
    builder.vector_section(SectionKind::Function, 1, b"b");
    builder.vector_section(SectionKind::Type, 1, b"c");
    let err = Module::parse(&builder.finish(), &host(&[])).unwrap_err();
    assert_eq!(*err.kind(), ErrorKind::SectionOrder(SectionKind::Type));
}

#[test]
fn custom_sections_are_order_exempt() -> anyhow::Result<()> {
    let mut builder = ModuleBuilder::new();
    builder.vector_section(SectionKind::Type, 1, b"a");
    builder.custom_section("notes", b"hi");
    builder.vector_section(SectionKind::Type, 1, b"b");
    builder.vector_section(SectionKind::Code, 1, b"c");
    builder.custom_section("more", b"");
    let wasm = builder.finish();
    let module = Module::parse(&wasm, &host(&[]))?;

    assert_eq!(module.section(SectionKind::Type).unwrap().count(), 2);
    let names: Vec<_> = module.custom_sections().iter().map(|c| c.name).collect();
    assert_eq!(names, ["notes", "more"]);
    Ok(())
}

#[test]
fn conditional_section_resolves_when_satisfied() -> anyhow::Result<()> {
    init_logging();
    let mut builder = ModuleBuilder::new();
    builder.vector_section(SectionKind::Type, 1, b"t");
    let mut simd_code = Vec::new();
    // One item of raw code bytes.
    simd_code.push(0x01);
    simd_code.extend_from_slice(b"simd!");
    builder.conditional_section(&require("simd"), &section_record(SectionKind::Code, &simd_code));

    let wasm = builder.finish();
    let module = Module::parse(&wasm, &host(&["simd"]))?;
    assert_eq!(module.section(SectionKind::Code).unwrap().bytes(), b"simd!");

    let module = Module::parse(&wasm, &host(&[]))?;
    assert!(module.section(SectionKind::Code).is_none());
    Ok(())
}

#[test]
fn conditional_sections_participate_in_aggregation() -> anyhow::Result<()> {
    let mut start_payload = Vec::new();
    start_payload.push(9);
    let mut builder = ModuleBuilder::new();
    builder.start_section(3);
    builder.conditional_section(
        &Predicate::always(),
        &section_record(SectionKind::Start, &start_payload),
    );
    builder.conditional_section(&require("absent"), &section_record(SectionKind::Start, &[5]));
    builder.data_count_section(2);
    builder.conditional_section(
        &Predicate::always(),
        &section_record(SectionKind::DataCount, &[5]),
    );
    let wasm = builder.finish();
    let module = Module::parse(&wasm, &host(&[]))?;
    assert_eq!(module.start(), [3, 9]);
    assert_eq!(module.data_count(), Some(7));
    Ok(())
}

#[test]
fn skipped_contents_are_never_inspected() -> anyhow::Result<()> {
    init_logging();
    // The contents are garbage: not a section record at all.
    let mut builder = ModuleBuilder::new();
    builder.conditional_section(&require("missing"), &[0xde, 0xad, 0xbe, 0xef]);
    // A nested conditional hidden behind an unsatisfied predicate is fine
    // too; unsupported future syntax must not break readers that skip it.
    let nested = section_record(
        SectionKind::Conditional,
        // Nonsense bytes standing in for some future construct.
        &[0xff, 0xff, 0xff],
    );
    builder.conditional_section(&Predicate::never(), &nested);
    let wasm = builder.finish();
    let module = Module::parse(&wasm, &host(&[]))?;
    assert!(module.custom_sections().is_empty());
    Ok(())
}

#[test]
fn satisfied_nested_conditional_is_rejected() {
    let inner = section_record(
        SectionKind::Conditional,
        &{
            let mut payload = Vec::new();
            wasm_cond::Encode::encode(&Predicate::always(), &mut payload);
            payload.push(0); // zero-length contents
            payload
        },
    );
    let mut builder = ModuleBuilder::new();
    builder.conditional_section(&Predicate::always(), &inner);
    let err = Module::parse(&builder.finish(), &host(&[])).unwrap_err();
    assert_eq!(*err.kind(), ErrorKind::NestedConditional);
}

#[test]
fn conditional_contents_must_be_one_record() {
    let mut two_records = section_record(SectionKind::Start, &[1]);
    two_records.extend_from_slice(&section_record(SectionKind::Start, &[2]));
    let mut builder = ModuleBuilder::new();
    builder.conditional_section(&Predicate::always(), &two_records);
    let err = Module::parse(&builder.finish(), &host(&[])).unwrap_err();
    assert_eq!(*err.kind(), ErrorKind::TrailingBytes);
}

#[test]
fn malformed_negation_flag_fails_even_when_skippable() {
    // Predicate with one conjunction of one feature whose negation flag is 2.
    // The predicate itself must be parsed before it can be evaluated, so this
    // fails no matter what the host supports.
    let mut payload = Vec::new();
    payload.push(1); // one conjunction
    payload.push(1); // one feature
    payload.push(2); // bad negation flag
    payload.push(1); // name length
    payload.push(b'x');
    payload.push(0); // zero-length contents
    let mut builder = ModuleBuilder::new();
    builder.section(SectionKind::Conditional, &payload);
    let wasm = builder.finish();

    for features in [host(&[]), host(&["x"])] {
        let err = Module::parse(&wasm, &features).unwrap_err();
        assert_eq!(*err.kind(), ErrorKind::MalformedFeature(2));
    }
}

#[test]
fn truncated_section_is_rejected() {
    let mut builder = ModuleBuilder::new();
    builder.raw(&[SectionKind::Type.id(), 10, 0x01]);
    let err = Module::parse(&builder.finish(), &host(&[])).unwrap_err();
    assert_eq!(*err.kind(), ErrorKind::TruncatedInput);
}

#[test]
fn unknown_section_id_is_rejected() {
    let mut builder = ModuleBuilder::new();
    builder.raw(&[15, 0]);
    let err = Module::parse(&builder.finish(), &host(&[])).unwrap_err();
    assert_eq!(*err.kind(), ErrorKind::UnknownSection(15));
}

#[test]
fn start_section_with_trailing_bytes_is_rejected() {
    let mut builder = ModuleBuilder::new();
    builder.section(SectionKind::Start, &[3, 4]);
    let err = Module::parse(&builder.finish(), &host(&[])).unwrap_err();
    assert_eq!(*err.kind(), ErrorKind::TrailingBytes);
}

#[test]
fn errors_report_offsets() {
    let mut builder = ModuleBuilder::new();
    builder.vector_section(SectionKind::Type, 1, b"a");
    builder.raw(&[15, 0]);
    let err = Module::parse(&builder.finish(), &host(&[])).unwrap_err();
    // Header (8) plus the type section record (id + length + 2 payload bytes).
    assert_eq!(err.offset(), Some(12));
    assert!(err.to_string().contains("at offset 0xc"));
}

#[test]
fn roundtrip_through_reencoding() -> anyhow::Result<()> {
    let features = host(&["simd"]);
    let mut builder = ModuleBuilder::new();
    builder.vector_section(SectionKind::Type, 2, b"tt");
    builder.vector_section(SectionKind::Function, 1, b"f");
    builder.conditional_section(
        &require("simd"),
        &section_record(SectionKind::Memory, &[0x01, 0x00, 0x10]),
    );
    builder.start_section(3);
    builder.start_section(7);
    builder.data_count_section(4);
    builder.vector_section(SectionKind::Code, 1, b"c");
    builder.custom_section("name", b"demo");
    let wasm = builder.finish();
    let module = Module::parse(&wasm, &features)?;

    let reencoded = module.encode();
    let module2 = Module::parse(&reencoded, &features)?;
    assert_eq!(module, module2);
    assert_eq!(module2.start(), [3, 7]);
    assert_eq!(module2.section(SectionKind::Memory).unwrap().count(), 1);

    // The re-encoded module carries no conditional sections, so the host's
    // features no longer matter.
    let module3 = Module::parse(&reencoded, &host(&[]))?;
    assert_eq!(module, module3);
    Ok(())
}
