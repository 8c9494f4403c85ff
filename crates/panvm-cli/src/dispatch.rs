use std::path::Path;
use std::process::{Command, ExitCode};

use anyhow::{anyhow, bail, Context, Result};
use panvm_catalog::{GitHubSource, ReleaseCatalog, SNAPSHOT_EXTENSION};
use panvm_core::{InstallSlot, Platform, VersionSpec, LATEST};
use panvm_installer::{
    default_user_root, read_nightly_commit, ActiveVersionPolicy, AliasTarget, HttpDownloader,
    NightlyOutcome, Session, UninstallOutcome, VersionsLayout,
};
use tracing::debug;

use crate::completion::write_completions_script;
use crate::config::{ConfigPolicy, PanvmConfig, DEFAULT_ALIAS};
use crate::prompt::TerminalPrompt;
use crate::render::{render_installed_line, with_spinner, TerminalRenderer};
use crate::{Cli, Commands};

/// What every command that touches installs needs: the data root and the
/// config read from it.
struct CliContext {
    layout: VersionsLayout,
    config: PanvmConfig,
    policy: ConfigPolicy,
}

impl CliContext {
    fn open(root: Option<&Path>) -> Result<Self> {
        let root = match root {
            Some(root) => root.to_path_buf(),
            None => default_user_root()?,
        };
        let layout = VersionsLayout::new(root);
        let config = PanvmConfig::load(&layout.config_path())?;
        let policy = ConfigPolicy::new(&config);
        Ok(Self {
            layout,
            config,
            policy,
        })
    }

    fn catalog(&self, use_snapshot: bool) -> Result<ReleaseCatalog> {
        let source = GitHubSource::new(self.config.api_url(), self.config.token())?;
        let snapshot = if use_snapshot {
            self.config.snapshot()
        } else {
            None
        };
        Ok(ReleaseCatalog::new(source).with_snapshot(snapshot))
    }

    fn session(&self) -> Result<Session> {
        let platform = Platform::detect()?;
        let downloader = HttpDownloader::new(self.config.api_url(), self.config.token())?;
        Ok(Session::new(
            self.layout.clone(),
            platform,
            self.catalog(true)?,
            downloader,
        )
        .with_policy(self.policy.clone()))
    }

    fn save_default(&mut self, slot: Option<&InstallSlot>) -> Result<()> {
        self.config.default_version = slot.map(ToString::to_string);
        self.config.save(&self.layout.config_path())?;
        self.policy = ConfigPolicy::new(&self.config);
        Ok(())
    }
}

pub(crate) fn run_cli(cli: Cli) -> Result<ExitCode> {
    let renderer = TerminalRenderer::current();

    let root = cli.root;

    match cli.command {
        Commands::Install { version, force } => {
            let context = CliContext::open(root.as_deref())?;
            let spec = managed_spec(
                &context.policy,
                VersionSpec::parse(version.as_deref().unwrap_or(LATEST)),
            )?;
            context.layout.ensure_base_dirs()?;
            let mut session = context.session()?;
            let installed = with_spinner(renderer, "install", || session.install(&spec, force))?;
            let label = describe_spec(&session, &spec);
            match installed {
                Some(dir) => renderer.print_status(
                    "ok",
                    &format!("installed pandoc {label} to {}", dir.display()),
                ),
                None => renderer.print_status(
                    "step",
                    &format!("pandoc {label} is already installed"),
                ),
            }
        }
        Commands::Nightly { n_last } => {
            let context = CliContext::open(root.as_deref())?;
            context.layout.ensure_base_dirs()?;
            let mut session = context.session()?;
            let n_last = usize::try_from(n_last).unwrap_or(usize::MAX);
            let outcome = with_spinner(renderer, "nightly", || session.install_nightly(n_last))?;
            let commit = read_nightly_commit(outcome.path())?
                .unwrap_or_else(|| "unknown commit".to_string());
            match outcome {
                NightlyOutcome::Installed(dir) => renderer.print_status(
                    "ok",
                    &format!("installed pandoc nightly ({commit}) to {}", dir.display()),
                ),
                NightlyOutcome::Unchanged(_) => renderer.print_status(
                    "step",
                    &format!("pandoc nightly is already at {commit}"),
                ),
            }
        }
        Commands::Uninstall { version } => {
            let mut context = CliContext::open(root.as_deref())?;
            let spec = managed_spec(&context.policy, VersionSpec::parse(&version))?;
            let mut session = context.session()?;
            match session.uninstall(&spec)? {
                UninstallOutcome::Removed(slot) => {
                    if context.policy.resolve_alias(DEFAULT_ALIAS)
                        == AliasTarget::Managed(slot.clone())
                    {
                        let next = session.active()?;
                        context.save_default(next.as_ref())?;
                        debug!(
                            default = next.as_ref().map(ToString::to_string).unwrap_or_default(),
                            "moved default version"
                        );
                    }
                    renderer.print_status("ok", &format!("uninstalled pandoc {slot}"));
                }
                UninstallOutcome::NotInstalled => {
                    renderer.print_status("warn", &format!("pandoc {version} is not installed"));
                }
            }
        }
        Commands::List => {
            let context = CliContext::open(root.as_deref())?;
            let mut session = context.session()?;
            let installed = session.installed_versions()?;
            if installed.is_empty() {
                println!("No pandoc versions installed");
                return Ok(ExitCode::SUCCESS);
            }
            let active = session.active()?;
            let lines = installed
                .iter()
                .map(|slot| {
                    render_installed_line(
                        renderer.style(),
                        slot.dir_name(),
                        active.as_ref() == Some(slot),
                    )
                })
                .collect::<Vec<_>>();
            renderer.print_lines(&lines);
        }
        Commands::Available => {
            let context = CliContext::open(root.as_deref())?;
            let catalog = context.catalog(true)?;
            let installed = panvm_installer::installed_versions(&context.layout)?;
            let versions = with_spinner(renderer, "catalog", || catalog.available_versions())?;
            for version in versions {
                let slot = InstallSlot::Release(version.clone());
                if installed.contains(&slot) {
                    println!("{version} (installed)");
                } else {
                    println!("{version}");
                }
            }
        }
        Commands::Use { version } => {
            let mut context = CliContext::open(root.as_deref())?;
            let spec = managed_spec(&context.policy, VersionSpec::parse(&version))?;
            let mut session = context.session()?;
            if !session.ensure_installed(&spec, &TerminalPrompt)? {
                bail!("pandoc {spec} is not installed");
            }
            let slot = session.activate(&spec)?;
            context.save_default(Some(&slot))?;
            renderer.print_status("ok", &format!("now using pandoc {slot}"));
        }
        Commands::Which { version } => {
            let context = CliContext::open(root.as_deref())?;
            let mut session = context.session()?;
            let slot = selected_slot(&context.policy, &mut session, version.as_deref())?;
            println!("{}", session.bin_path(&slot).display());
        }
        Commands::Run { use_version, args } => {
            let context = CliContext::open(root.as_deref())?;
            let mut session = context.session()?;
            if let Some(version) = use_version.as_deref() {
                let spec = managed_spec(&context.policy, VersionSpec::parse(version))?;
                if !session.ensure_installed(&spec, &TerminalPrompt)? {
                    bail!("pandoc {spec} is not installed");
                }
            }
            let slot = selected_slot(&context.policy, &mut session, use_version.as_deref())?;
            let binary = session.bin_path(&slot);
            return run_binary(&binary, &args);
        }
        Commands::Snapshot { path } => {
            ensure_snapshot_extension(&path)?;
            let context = CliContext::open(root.as_deref())?;
            let catalog = context.catalog(false)?;
            with_spinner(renderer, "catalog", || catalog.write_snapshot(&path))?;
            let count = catalog.list_releases()?.len();
            renderer.print_status(
                "ok",
                &format!("wrote {count} releases to {}", path.display()),
            );
        }
        Commands::Doctor => {
            let context = CliContext::open(root.as_deref())?;
            let lines = doctor_lines(&context)?;
            renderer.print_section("panvm");
            renderer.print_lines(&lines);
        }
        Commands::Completions { shell } => {
            let mut stdout = std::io::stdout().lock();
            write_completions_script(shell, &mut stdout)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Maps aliases onto managed versions; aliases the policy does not manage
/// are refused here rather than deep in the installer.
pub(crate) fn managed_spec(policy: &ConfigPolicy, spec: VersionSpec) -> Result<VersionSpec> {
    let VersionSpec::External(name) = &spec else {
        return Ok(spec);
    };
    match policy.resolve_alias(name) {
        AliasTarget::Managed(InstallSlot::Nightly) => Ok(VersionSpec::Nightly),
        AliasTarget::Managed(InstallSlot::Release(version)) => Ok(VersionSpec::Specific(version)),
        AliasTarget::External => Err(anyhow!(
            "'{name}' is not a pandoc version managed by panvm"
        )),
    }
}

fn selected_slot(
    policy: &ConfigPolicy,
    session: &mut Session,
    version: Option<&str>,
) -> Result<InstallSlot> {
    match version {
        Some(version) => {
            let spec = managed_spec(policy, VersionSpec::parse(version))?;
            Ok(session.require_installed(&spec)?)
        }
        None => session
            .active()?
            .ok_or_else(|| anyhow!("no active pandoc version; run `panvm install` first")),
    }
}

fn describe_spec(session: &Session, spec: &VersionSpec) -> String {
    match spec {
        VersionSpec::Latest => session
            .catalog()
            .latest()
            .map(|release| release.tag.clone())
            .unwrap_or_else(|_| LATEST.to_string()),
        other => other.to_string(),
    }
}

fn run_binary(binary: &Path, args: &[String]) -> Result<ExitCode> {
    if !binary.is_file() {
        bail!("pandoc executable is missing: {}", binary.display());
    }
    debug!(binary = %binary.display(), ?args, "running pandoc");
    let status = Command::new(binary)
        .args(args)
        .status()
        .with_context(|| format!("failed to run {}", binary.display()))?;
    Ok(ExitCode::from(exit_status_byte(status.code())))
}

/// Child exit status as our own. Codes outside `u8` and signal deaths map to 1.
pub(crate) fn exit_status_byte(code: Option<i32>) -> u8 {
    code.and_then(|code| u8::try_from(code).ok()).unwrap_or(1)
}

pub(crate) fn ensure_snapshot_extension(path: &Path) -> Result<()> {
    if path.extension().and_then(|ext| ext.to_str()) != Some(SNAPSHOT_EXTENSION) {
        bail!(
            "snapshot path must end in .{SNAPSHOT_EXTENSION}: {}",
            path.display()
        );
    }
    Ok(())
}

fn doctor_lines(context: &CliContext) -> Result<Vec<String>> {
    let layout = &context.layout;
    let platform = match Platform::detect() {
        Ok(platform) => format!("{}/{}", platform.os.as_str(), platform.arch.as_str()),
        Err(err) => format!("unsupported ({err})"),
    };
    let installed = panvm_installer::installed_versions(layout)?;
    let snapshot = context.config.snapshot();

    Ok(vec![
        format!("root: {}", layout.root().display()),
        format!("versions: {}", layout.versions_dir().display()),
        format!("config: {}", layout.config_path().display()),
        format!("platform: {platform}"),
        format!("api: {}", context.config.api_url()),
        format!(
            "token: {}",
            if context.config.token().is_some() {
                "set"
            } else {
                "not set"
            }
        ),
        format!(
            "snapshot: {}",
            snapshot
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "none".to_string())
        ),
        format!(
            "default: {}",
            context.config.default_version.as_deref().unwrap_or("none")
        ),
        format!("installed: {}", installed.len()),
    ])
}
