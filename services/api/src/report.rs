use maizebus::config::AppConfig;
use maizebus::error::AppError;
use maizebus::mail::MailDispatcher;

pub(crate) fn run_check_config() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let dispatcher = MailDispatcher::from_config(&config.mail)?;

    for line in describe(&config, &dispatcher) {
        println!("{line}");
    }
    Ok(())
}

/// One line per setting; the SMTP password is never included.
pub(crate) fn describe(config: &AppConfig, dispatcher: &MailDispatcher) -> Vec<String> {
    let mut lines = vec![
        format!("environment: {:?}", config.environment),
        format!("listen: {}:{}", config.server.host, config.server.port),
        format!("log level: {}", config.telemetry.log_level),
        format!("mail dispatcher: {}", dispatcher.label()),
    ];

    match config.mail.sender() {
        Some(sender) => lines.push(format!(
            "smtp: {}:{} ({}) as {sender}",
            config.mail.host, config.mail.port, config.mail.security
        )),
        None => lines.push(
            "smtp: EMAIL_USER/EMAIL_PASS not set; submissions are written to the log".to_string(),
        ),
    }
    lines.push(format!("recipient: {}", config.mail.recipient));
    lines.push(format!(
        "cors origins: {}",
        config.cors.allowed_origins.join(", ")
    ));
    lines.push(format!(
        "uploads: {} (max {}MB)",
        config.uploads.dir.display(),
        config.uploads.max_bytes / (1024 * 1024)
    ));

    let bundle = if config.frontend.dist_dir.join("index.html").is_file() {
        "built"
    } else {
        "missing"
    };
    lines.push(format!(
        "client bundle: {} ({bundle})",
        config.frontend.dist_dir.display()
    ));

    lines
}
