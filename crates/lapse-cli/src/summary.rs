use std::path::Path;

use console::Style;
use lapse_core::brightness::CalculationMode;
use lapse_core::project::{FrameRow, Project};

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
    keyframe: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
            keyframe: Style::new().magenta().bold(),
        }
    }
}

pub fn print_project_summary(project: &Project, source: &Path) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Lapse Project"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(13)));
    println!();
    println!("  {:<14}{}", s.label.apply_to("Source"), s.path.apply_to(source.display()));
    println!("  {:<14}{}", s.label.apply_to("Kind"), s.method.apply_to(project.kind().name()));
    println!("  {:<14}{}", s.label.apply_to("Frames"), s.value.apply_to(project.frame_count()));
    println!(
        "  {:<14}{}",
        s.label.apply_to("Keyframes"),
        s.value.apply_to(project.keyframe_count())
    );
    match project.calculation_mode() {
        Some(mode) if project.is_brightness_calculated() => {
            println!("  {:<14}{}", s.label.apply_to("Brightness"), s.method.apply_to(mode));
            println!("  {:<14}{}", "", s.label.apply_to(mode.description()));
        }
        _ => println!(
            "  {:<14}{}",
            s.label.apply_to("Brightness"),
            s.disabled.apply_to("not calculated")
        ),
    }
    println!();
}

pub fn print_frame_table(rows: &[FrameRow], exposures: &[f64]) {
    let s = Styles::new();

    println!(
        "  {}",
        s.header.apply_to(format!(
            "{:>4}  {:<24}{:>11}{:>9}  {:<8}{:<10}{:<8}{}",
            "#", "File", "Brightness", "EV", "AV", "TV", "ISO", "Key"
        ))
    );
    for (row, exposure) in rows.iter().zip(exposures) {
        let key = if row.is_keyframe {
            s.keyframe.apply_to("\u{25c6}").to_string()
        } else {
            String::new()
        };
        println!(
            "  {:>4}  {:<24}{:>11}{:>+9.3}  {:<8}{:<10}{:<8}{}",
            row.number,
            row.filename,
            row.brightness,
            exposure,
            row.aperture,
            row.shutter,
            row.iso,
            key
        );
    }
    println!();
}

pub fn print_calculation(mode: CalculationMode, keyframes: &[usize]) {
    let s = Styles::new();
    let numbers: Vec<String> = keyframes.iter().map(|k| (k + 1).to_string()).collect();
    println!(
        "  {:<14}{} {}",
        s.label.apply_to("Calculated"),
        s.method.apply_to(mode),
        s.label.apply_to(format!("(keyframes {})", numbers.join(", ")))
    );
}

pub fn print_output_summary(out_dir: &Path, written: usize, deferred: usize) {
    let s = Styles::new();
    println!();
    println!("  {:<14}{}", s.label.apply_to("Output"), s.path.apply_to(out_dir.display()));
    println!("  {:<14}{}", s.label.apply_to("Written"), s.value.apply_to(written));
    if deferred > 0 {
        println!(
            "  {:<14}{}",
            s.label.apply_to("Deferred"),
            s.disabled.apply_to(format!("{deferred} (16-bit sources are not rendered yet)"))
        );
    }
}
