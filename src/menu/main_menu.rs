use crate::component::sprite_generator::MAX_FRAME_HEIGHT;
use crate::config::save::save_settings;
use crate::config::{Config, Language};
use crate::menu::handlers::run_sprite_preview;
use crate::pause;
use anyhow::Result;
use console::{Term, style};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use rust_i18n::t;
use std::path::PathBuf;
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
        t!("main_menu.opt_generate"),
        t!("main_menu.opt_settings"),
        t!("main_menu.exit"),
    ];

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(t!("main_menu.prompt"))
        .items(&options)
        .default(0)
        .interact_on_opt(term)?;

    match selection {
        Some(0) => {
            run_sprite_preview(term, shutdown_signal, config)?;
            Ok(true)
        }
        Some(1) => {
            show_settings_menu(term, config)?;
            Ok(true)
        }
        Some(2) | None => Ok(false),
        _ => unreachable!(),
    }
}

/// 設定選單
fn show_settings_menu(term: &Term, config: &mut Config) -> Result<()> {
    loop {
        term.clear_screen()?;
        println!("{}", style(t!("settings.title")).cyan().bold());
        println!("{}", style(t!("common.esc_hint")).dim());

        let settings = &config.settings;
        let options = vec![
            t!("settings.opt_interval", value = settings.interval_seconds).to_string(),
            t!("settings.opt_max_frames", value = settings.max_frames).to_string(),
            t!("settings.opt_frame_height", value = settings.frame_height).to_string(),
            t!("settings.opt_output_root", value = settings.output_root.display()).to_string(),
            t!("settings.opt_url_prefix", value = settings.url_prefix).to_string(),
            t!("settings.opt_language", value = settings.language).to_string(),
            t!("settings.back").to_string(),
        ];

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(t!("settings.prompt"))
            .items(&options)
            .default(0)
            .interact_on_opt(term)?;

        let settings = &mut config.settings;
        match selection {
            Some(0) => {
                settings.interval_seconds =
                    prompt_in_range(&t!("settings.input_interval"), settings.interval_seconds, u64::MAX)?;
            }
            Some(1) => {
                settings.max_frames =
                    prompt_in_range(&t!("settings.input_max_frames"), settings.max_frames, u64::MAX)?;
            }
            Some(2) => {
                let height = prompt_in_range(
                    &t!("settings.input_frame_height", max = MAX_FRAME_HEIGHT),
                    u64::from(settings.frame_height),
                    u64::from(MAX_FRAME_HEIGHT),
                )?;
                settings.frame_height = u32::try_from(height)?;
            }
            Some(3) => {
                let path: String = Input::new()
                    .with_prompt(t!("settings.input_output_root"))
                    .with_initial_text(settings.output_root.to_string_lossy())
                    .interact_text()?;
                settings.output_root = PathBuf::from(path.trim());
            }
            Some(4) => {
                let prefix: String = Input::new()
                    .with_prompt(t!("settings.input_url_prefix"))
                    .with_initial_text(settings.url_prefix.clone())
                    .interact_text()?;
                settings.url_prefix = prefix.trim().to_string();
            }
            Some(5) => {
                if !select_language(term, config)? {
                    continue;
                }
            }
            _ => return Ok(()),
        }

        if let Err(e) = save_settings(&config.settings) {
            eprintln!("{} {:#}", style(t!("settings.save_failed")).red().bold(), e);
            pause(term)?;
        }
    }
}

/// 回傳 `true` 表示語言有變更
fn select_language(term: &Term, config: &mut Config) -> Result<bool> {
    let items: Vec<String> = Language::ALL.iter().map(ToString::to_string).collect();
    let default_index = Language::ALL
        .iter()
        .position(|&l| l == config.settings.language)
        .unwrap_or(0);

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(t!("settings.language_prompt"))
        .items(&items)
        .default(default_index)
        .interact_on_opt(term)?;

    let Some(selection) = selection else {
        return Ok(false);
    };

    let selected = Language::ALL[selection];
    if selected == config.settings.language {
        return Ok(false);
    }

    config.settings.language = selected;
    rust_i18n::set_locale(selected.as_str());
    println!("\n{} {selected}", style(t!("settings.saved")).green());
    std::thread::sleep(std::time::Duration::from_secs(1));
    Ok(true)
}

fn prompt_in_range(prompt: &str, current: u64, max: u64) -> Result<u64> {
    let value: u64 = Input::new()
        .with_prompt(prompt)
        .default(current)
        .validate_with(move |v: &u64| -> Result<(), String> {
            if *v == 0 {
                Err(t!("settings.must_be_positive").to_string())
            } else if *v > max {
                Err(t!("settings.out_of_range", max = max).to_string())
            } else {
                Ok(())
            }
        })
        .interact_text()?;
    Ok(value)
}
