use crate::config::save::save_settings;
use crate::config::{Config, Language};
use crate::menu::handlers::{run_video_synthesizer, run_video_transcoder};
use anyhow::Result;
use console::{Term, style};
use dialoguer::Select;
use dialoguer::theme::ColorfulTheme;
use rust_i18n::t;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

pub fn show_main_menu(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    config: &mut Config,
) -> Result<bool> {
    term.clear_screen()?;

    println!("{}", style(t!("main_menu.title")).cyan().bold());
    println!("{}", style(t!("common.esc_hint")).dim());

    let options = vec![
        t!("main_menu.opt_synthesis"),
        t!("main_menu.opt_transcode"),
        t!("main_menu.opt_language"),
        t!("main_menu.exit"),
    ];

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(t!("main_menu.prompt"))
        .items(&options)
        .default(0)
        .interact_on_opt(term)?;

    match selection {
        Some(0) => {
            run_video_synthesizer(term, shutdown_signal, config)?;
            Ok(true)
        }
        Some(1) => {
            run_video_transcoder(term, shutdown_signal, config)?;
            Ok(true)
        }
        Some(2) => {
            show_language_menu(term, config)?;
            Ok(true)
        }
        Some(3) | None => Ok(false), // ESC pressed - exit
        _ => unreachable!(),
    }
}

/// 語言設定選單
fn show_language_menu(term: &Term, config: &mut Config) -> Result<()> {
    term.clear_screen()?;

    println!("{}", style(t!("settings.language.title")).cyan().bold());
    println!("{}", style(t!("common.esc_hint")).dim());

    let items: Vec<String> = Language::ALL.iter().map(Language::to_string).collect();
    let default_index = Language::ALL
        .iter()
        .position(|&l| l == config.settings.language)
        .unwrap_or(0);

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(t!("settings.language.prompt"))
        .items(&items)
        .default(default_index)
        .interact_on_opt(term)?;

    let Some(selection) = selection else {
        return Ok(());
    };

    let selected = Language::ALL[selection];
    if selected != config.settings.language {
        config.settings.language = selected;
        rust_i18n::set_locale(selected.as_str());
        save_settings(&config.settings)?;
        println!("\n{} {}", style(t!("settings.saved")).green(), selected);
        std::thread::sleep(std::time::Duration::from_secs(1));
    }

    Ok(())
}
