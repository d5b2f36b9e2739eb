mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use cli::{Cli, Command};
use studymate_lib::{
    db::{InteractionRecord, StudyMode},
    resolve_data_dir,
    tutor::{LevelRollover, RewardPolicy},
    App,
};

fn main() -> Result<()> {
    let cli = Cli::parse();
    studymate_lib::init_logging();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    let data_dir = resolve_data_dir(cli.data_dir);
    let app = App::open(data_dir, cli.command.needs_generation()).await?;
    let tutor = &app.controller;
    let json = cli.json;

    match cli.command {
        Command::Register { student, name } => {
            let student = tutor.register_student(&student, &name).await?;
            print_or(json, &student, || {
                format!("Registered {} ({})", student.display_name, student.id)
            })?;
        }
        Command::Students => {
            let students = tutor.list_students().await?;
            print_or(json, &students, || {
                students
                    .iter()
                    .map(|s| {
                        format!(
                            "{}\t{}\t{}\tlevel {} ({} exp, {} to go)\tfocus {}",
                            s.id,
                            s.display_name,
                            s.mode.as_str(),
                            s.progress.level,
                            s.progress.exp,
                            s.progress.exp_to_next_level(),
                            s.progress.focus_score
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
        }
        Command::Ask {
            student,
            question,
            subject,
        } => {
            let report = tutor.submit_question(&student, &subject, &question).await?;
            print_or(json, &report, || {
                let mut out = format!("{}\n\n[{}] [{}]", report.reply, report.status, report.category);
                if let Some(level_up) = report.level_up {
                    out.push_str(&format!("\nLevel up! {} -> {}", level_up.from, level_up.to));
                }
                out
            })?;
        }
        Command::SubmitImage {
            student,
            image,
            subject,
        } => {
            let bytes = tokio::fs::read(&image)
                .await
                .with_context(|| format!("Failed to read {}", image.display()))?;
            let report = tutor.submit_image(&student, &subject, &bytes).await?;
            print_or(json, &report, || {
                format!("{}\n\n+{} exp", report.summary, report.exp_awarded)
            })?;
        }
        Command::SetMode { student, mode } => {
            let mode: StudyMode = mode.parse()?;
            tutor.set_mode(&student, mode).await?;
            println!("{student} is now in {} mode", mode.as_str());
        }
        Command::SetPermission { student, allowed } => {
            tutor.set_detail_permission(&student, allowed).await?;
            println!("Detailed explanations for {student}: {allowed}");
        }
        Command::Bookmark { log_id } => {
            let bookmarked = tutor.toggle_bookmark(&log_id).await?;
            println!("{log_id} bookmarked: {bookmarked}");
        }
        Command::Similar {
            log_id,
            concept,
            count,
        } => {
            let report = tutor.request_similar_problems(&log_id, &concept, count).await?;
            print_or(json, &report, || report.content.clone())?;
        }
        Command::Review {
            student,
            subject,
            concept,
        } => {
            let report = tutor.request_review_quiz(&student, &subject, &concept).await?;
            print_or(json, &report, || {
                format!("Concepts: {}\n\n{}", report.concepts.join(", "), report.content)
            })?;
        }
        Command::History { student, limit } => {
            let records = tutor.list_interactions(&student, Some(limit)).await?;
            print_or(json, &records, || {
                records.iter().map(history_line).collect::<Vec<_>>().join("\n")
            })?;
        }
        Command::Report { student } => {
            let report = tutor.parent_report(&student).await?;
            // the parent view is structured data either way
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Settings {
            policy,
            rollover,
            log_failed_turns,
            subject,
            model,
            timeout_secs,
        } => {
            let policy = policy.map(|p| p.parse::<RewardPolicy>()).transpose()?;
            let rollover = rollover.map(|r| r.parse::<LevelRollover>()).transpose()?;

            let current = if policy.is_none()
                && rollover.is_none()
                && log_failed_turns.is_none()
                && subject.is_none()
                && model.is_none()
                && timeout_secs.is_none()
            {
                app.settings.current()
            } else {
                app.settings.update(|settings| {
                    if let Some(policy) = policy {
                        settings.reward_policy = policy;
                    }
                    if let Some(rollover) = rollover {
                        settings.level_rollover = rollover;
                    }
                    if let Some(flag) = log_failed_turns {
                        settings.log_failed_turns = flag;
                    }
                    if let Some(subject) = subject {
                        settings.default_subject = subject;
                    }
                    if let Some(model) = model {
                        settings.generation.model = (model != "auto").then_some(model);
                    }
                    if let Some(secs) = timeout_secs {
                        settings.generation.timeout_secs = secs;
                    }
                })?
            };
            println!("{}", serde_json::to_string_pretty(&current)?);
        }
    }

    Ok(())
}

fn print_or<T: Serialize>(json: bool, value: &T, text: impl FnOnce() -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", text());
    }
    Ok(())
}

fn history_line(record: &InteractionRecord) -> String {
    format!(
        "{}{}  {}  {:<11}  {}  [{}]  {}",
        if record.bookmarked { "* " } else { "  " },
        record.created_at.format("%Y-%m-%d %H:%M"),
        record.id,
        record.log_type.as_str(),
        record.status,
        record.category,
        record.question
    )
}
