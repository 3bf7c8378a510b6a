pub mod calculate;
pub mod config;
pub mod info;
pub mod process;
pub mod run;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use lapse_core::brightness::CalculationMode;
use lapse_core::config::LapseConfig;
use lapse_core::process::SaveFormat;
use lapse_core::project::{ExternalConverterSettings, LapseStudioSettings, Project, ProjectKind};

#[derive(Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Simple,
    Exif,
    Lab,
    Advanced,
    Advanced2,
}

impl From<ModeArg> for CalculationMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Simple => CalculationMode::Simple,
            ModeArg::Exif => CalculationMode::Exif,
            ModeArg::Lab => CalculationMode::Lab,
            ModeArg::Advanced => CalculationMode::Advanced,
            ModeArg::Advanced2 => CalculationMode::AdvancedII,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum KindArg {
    /// Render corrected images directly
    LapseStudio,
    /// Write exposure sidecars for a raw converter
    External,
}

impl From<KindArg> for ProjectKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::LapseStudio => ProjectKind::LapseStudio(LapseStudioSettings::default()),
            KindArg::External => {
                ProjectKind::ExternalConverter(ExternalConverterSettings::default())
            }
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum FormatArg {
    Jpeg,
    Png,
    Tiff,
    Bmp,
}

impl From<FormatArg> for SaveFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Jpeg => SaveFormat::Jpeg,
            FormatArg::Png => SaveFormat::Png,
            FormatArg::Tiff => SaveFormat::Tiff,
            FormatArg::Bmp => SaveFormat::Bmp,
        }
    }
}

/// Options shared by the commands that read settings.
#[derive(Args)]
pub struct SettingsArgs {
    /// Settings file (TOML); defaults are used when absent
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output image format, overriding the settings file
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,

    /// Worker threads for rendering (0 = one per core)
    #[arg(long)]
    pub threads: Option<usize>,
}

impl SettingsArgs {
    pub fn load(&self) -> Result<LapseConfig> {
        let mut config = match &self.config {
            Some(path) => LapseConfig::load(path)
                .with_context(|| format!("Failed to read settings {}", path.display()))?,
            None => LapseConfig::default(),
        };
        if let Some(format) = self.format {
            config.save_format = format.into();
        }
        if let Some(threads) = self.threads {
            config.thread_count = threads;
        }
        Ok(config)
    }
}

/// Flag `indices` as keyframes; with none given, the first and last frame.
pub fn apply_keyframes(project: &Project, indices: &[usize]) -> Result<Vec<usize>> {
    let count = project.frame_count();
    let mut chosen: Vec<usize> = if indices.is_empty() {
        vec![0, count.saturating_sub(1)]
    } else {
        indices.to_vec()
    };
    chosen.sort_unstable();
    chosen.dedup();
    for &index in &chosen {
        let already =
            project.with_frames(|frames| frames.get(index).is_some_and(|f| f.is_keyframe));
        if !already {
            project
                .toggle_keyframe(index)
                .with_context(|| format!("Cannot use frame {index} as keyframe"))?;
        }
    }
    Ok(chosen)
}
