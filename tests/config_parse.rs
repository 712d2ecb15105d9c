use jobsheet_pdf::{Config, SiteVariant};

#[test]
fn parse_example_config() {
    let raw = include_str!("../jobsheet-pdf.example.toml");
    let cfg = Config::parse(raw).expect("parse TOML");
    assert_eq!(cfg.render.jpeg_quality, 80);
    assert_eq!(cfg.render.settle_delay_ms, 100);
    assert_eq!(cfg.output.dir, "out");
    assert_eq!(SiteVariant::from_config(&cfg.branding), SiteVariant::Default);
}
