use anyhow::Result;
use clap::{Parser, Subcommand};
use mimic_common::Span;
use mimic_common::observability::LogFormat;
use mimic_config::MimicConfig;
use mimic_engine::{BehavioralEngine, Point, Replayer, ScrollDirection, TracingSink};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Generate human-like pointer paths, typing and scrolling sequences.
#[derive(Debug, Parser)]
#[command(name = "mimic", version, about)]
pub struct Cli {
    /// YAML config file; defaults to `<config dir>/mimic/mimic.yaml` when present.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Seed every generator for reproducible output.
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Log encoding (text or json); overrides the config file.
    #[arg(long, global = true, value_name = "FORMAT")]
    pub log_format: Option<LogFormat>,

    /// Mirror logs to stderr.
    #[arg(long, global = true)]
    pub stderr: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print a pointer path as JSON points.
    Path {
        /// Start position as `x,y`; defaults to the viewport centre.
        #[arg(long, value_name = "X,Y")]
        from: Option<Point>,
        /// Target position as `x,y`.
        #[arg(long, value_name = "X,Y")]
        to: Point,
        #[arg(long)]
        no_overshoot: bool,
    },
    /// Print the key sequence for typing TEXT.
    Type {
        text: String,
        #[arg(long, requires = "wpm_max")]
        wpm_min: Option<u32>,
        #[arg(long, requires = "wpm_min")]
        wpm_max: Option<u32>,
        #[arg(long)]
        typo_probability: Option<f64>,
    },
    /// Print a scroll sequence covering DISTANCE pixels.
    Scroll {
        distance: u32,
        /// forward/down or backward/up.
        #[arg(long, default_value = "forward")]
        direction: ScrollDirection,
        /// Evenly split steps instead of randomized chunks.
        #[arg(long)]
        smooth: bool,
        #[arg(long, requires = "chunk_max", conflicts_with = "smooth")]
        chunk_min: Option<u32>,
        #[arg(long, requires = "chunk_min", conflicts_with = "smooth")]
        chunk_max: Option<u32>,
    },
    /// Sleep a humanized duration and report it.
    Sleep {
        /// Base seconds for `base ± variance`.
        #[arg(long, conflicts_with_all = ["min", "max"])]
        base: Option<f64>,
        #[arg(long, conflicts_with_all = ["min", "max"])]
        variance: Option<f64>,
        /// Uniform range lower bound in seconds.
        #[arg(long)]
        min: Option<f64>,
        #[arg(long)]
        max: Option<f64>,
    },
    /// Replay a click, some typing and a scroll against a logging sink.
    Rehearse {
        #[arg(long, value_name = "X,Y")]
        click: Option<Point>,
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        scroll: Option<u32>,
        #[arg(long, default_value = "forward")]
        direction: ScrollDirection,
    },
}

#[derive(Debug, Serialize)]
struct SleepReport {
    slept_ms: f64,
}

#[derive(Debug, Serialize)]
struct RehearsalReport {
    cursor: Point,
    events: TracingSink,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn engine(cli_seed: Option<u64>, cfg: &MimicConfig) -> BehavioralEngine {
    match cli_seed {
        Some(seed) => BehavioralEngine::with_seed(cfg.humanize.clone(), seed),
        None => BehavioralEngine::new(cfg.humanize.clone()),
    }
}

pub async fn run(cli: Cli, cfg: MimicConfig, cancel: CancellationToken) -> Result<()> {
    let engine = engine(cli.seed, &cfg);

    match cli.command {
        Command::Path {
            from,
            to,
            no_overshoot,
        } => {
            let from = from.unwrap_or_else(|| engine.start_position());
            print_json(&engine.generate_path(from, to, !no_overshoot))
        }
        Command::Type {
            text,
            wpm_min,
            wpm_max,
            typo_probability,
        } => {
            let wpm = wpm_min.zip(wpm_max).map(|(min, max)| Span::new(min, max));
            print_json(&engine.generate_typing(&text, wpm, typo_probability))
        }
        Command::Scroll {
            distance,
            direction,
            smooth,
            chunk_min,
            chunk_max,
        } => {
            let distance = i64::from(distance);
            let actions = if smooth {
                engine.generate_smooth_scroll(direction, distance)
            } else {
                let chunk = chunk_min.zip(chunk_max).map(|(min, max)| Span::new(min, max));
                engine.generate_scroll(direction, distance, chunk)
            };
            print_json(&actions)
        }
        Command::Sleep {
            base,
            variance,
            min,
            max,
        } => {
            let slept = if min.is_some() || max.is_some() {
                engine.sleep_range(min, max, &cancel).await?
            } else {
                engine.sleep(base, variance, &cancel).await?
            };
            print_json(&SleepReport {
                slept_ms: slept.as_secs_f64() * 1000.0,
            })
        }
        Command::Rehearse {
            click,
            text,
            scroll,
            direction,
        } => {
            let mut replayer = Replayer::new(Arc::new(engine), TracingSink::default(), cancel);
            if let Some(target) = click {
                replayer.click_at(target).await?;
            }
            if let Some(text) = text.as_deref() {
                replayer.type_text(text).await?;
            }
            if let Some(distance) = scroll {
                replayer.scroll(direction, i64::from(distance)).await?;
            }
            info!(target: "mimic.cli", cursor = %replayer.cursor(), "rehearsal finished");
            print_json(&RehearsalReport {
                cursor: replayer.cursor(),
                events: replayer.into_sink(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_path_points_and_globals() {
        let cli = Cli::try_parse_from([
            "mimic", "path", "--to", "640,360", "--seed", "7", "--log-format", "json",
        ])
        .unwrap();
        assert_eq!(cli.seed, Some(7));
        assert_eq!(cli.log_format, Some(LogFormat::Json));
        match cli.command {
            Command::Path { from, to, no_overshoot } => {
                assert!(from.is_none());
                assert_eq!(to, Point::new(640.0, 360.0));
                assert!(!no_overshoot);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_half_a_wpm_range() {
        assert!(Cli::try_parse_from(["mimic", "type", "hi", "--wpm-min", "30"]).is_err());
    }

    #[test]
    fn smooth_scroll_excludes_chunk_bounds() {
        assert!(
            Cli::try_parse_from([
                "mimic", "scroll", "400", "--smooth", "--chunk-min", "10", "--chunk-max", "20"
            ])
            .is_err()
        );
        let cli = Cli::try_parse_from(["mimic", "scroll", "400", "--direction", "up"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Scroll {
                direction: ScrollDirection::Backward,
                distance: 400,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn seeded_path_command_runs() {
        let cli = Cli::try_parse_from([
            "mimic", "path", "--from", "0,0", "--to", "50,50", "--seed", "3",
        ])
        .unwrap();
        run(cli, MimicConfig::default(), CancellationToken::new())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn cancelled_sleep_fails() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let cli = Cli::try_parse_from(["mimic", "sleep", "--base", "5"]).unwrap();
        assert!(run(cli, MimicConfig::default(), cancel).await.is_err());
    }
}
