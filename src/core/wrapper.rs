use crate::core::{ConfigProvider, JobKind, WrapperScript};

/// 單引號跳脫，讓插進 shell 指令的值保持原樣
pub fn shell_quote(value: &str) -> String {
    let plain = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '-' | '_' | ':' | '='));

    if plain {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', r"'\''"))
    }
}

/// 渲染單一包裝腳本：環境準備加上一行訓練程式呼叫
pub fn render_wrapper<C: ConfigProvider>(kind: JobKind, config: &C) -> WrapperScript {
    let mut lines = vec![
        "#!/bin/bash".to_string(),
        format!(
            "# generated by rl-launch at {}",
            chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ")
        ),
        String::new(),
    ];

    if !config.setup_commands().is_empty() {
        for command in config.setup_commands() {
            lines.push(command.clone());
        }
        lines.push(String::new());
    }

    if let Some(module_path) = config.module_search_path() {
        lines.push(format!(
            "export PYTHONPATH={}:\"$PYTHONPATH\"",
            shell_quote(module_path)
        ));
    }

    for (key, value) in config.extra_environment() {
        lines.push(format!("export {}={}", key, shell_quote(&value)));
    }

    if kind == JobKind::Rollout {
        // rollout 只吃 CPU，不讓模擬工作佔住 GPU
        lines.push("export CUDA_VISIBLE_DEVICES=-1".to_string());
    }

    lines.push(String::new());
    lines.push(format!("cd {}", shell_quote(config.working_dir())));
    lines.push(format!(
        "{} {} --config={}",
        config.program_command(),
        kind.mode_flag(),
        shell_quote(config.run_config())
    ));
    lines.push(String::new());

    WrapperScript {
        kind,
        file_name: kind.script_file_name().to_string(),
        content: lines.join("\n"),
    }
}
