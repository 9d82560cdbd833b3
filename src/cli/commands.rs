//! CLI command handlers.
//!
//! Thin presentation over the monitoring core: every handler either reads a
//! status surface and prints it, or invokes one of the engine's control
//! operations. No monitoring logic lives here.

use std::path::Path;
use std::sync::Arc;
use std::thread;

use chrono::Local;
use color_eyre::eyre::eyre;
use color_eyre::Result;

use crate::config::{self, AppConfig};
use crate::constants;
use crate::core::monitor::Monitor;
use crate::core::parser::parse_status;
use crate::core::public_ip;
use crate::platform;
use crate::state::{HostNetworkInfo, MonitorStatus, VpnState};
use crate::utils::format_duration_since;
use crate::vpn::{self, Scutil, StatusSource};

/// One synchronous observation, for the one-shot commands.
///
/// `wants_connected` stays false here: a one-shot run carries no recorded
/// intent, only what the system reports right now.
fn observe_once(source: &Scutil, service: &str, app: &AppConfig) -> MonitorStatus {
    let snapshot = parse_status(&source.status_text(service));
    MonitorStatus {
        service: service.to_string(),
        tunnel_ip: if snapshot.state == VpnState::Connected {
            snapshot.tunnel_ip
        } else {
            None
        },
        state: snapshot.state,
        interface: snapshot.interface,
        since: snapshot.since,
        host: HostNetworkInfo {
            local_ip: platform::local_ipv4(),
            public_ip: public_ip::fetch_public_ip(&app.public_ip_apis, app.api_timeout_secs),
        },
        wants_connected: false,
    }
}

/// `status [--json]`
pub fn status(service: &str, app: &AppConfig, json: bool) -> Result<()> {
    let source = Scutil::new(app.command_timeout());
    let observed = observe_once(&source, service, app);

    if json {
        println!("{}", serde_json::to_string_pretty(&observed)?);
    } else {
        print_status(&observed);
    }
    Ok(())
}

fn print_status(status: &MonitorStatus) {
    let absent = constants::MSG_NO_DATA;
    println!("  Service:    {}", status.service);
    println!("  State:      {}", status.state);
    println!(
        "  Tunnel IP:  {}",
        status.tunnel_ip.as_deref().unwrap_or(absent)
    );
    println!(
        "  Interface:  {}",
        status.interface.as_deref().unwrap_or(absent)
    );
    if status.state == VpnState::Connected {
        if let Some(since) = status.since {
            println!(
                "  Uptime:     {} (since {})",
                format_duration_since(since, Local::now()),
                since.format("%m/%d/%Y %H:%M:%S")
            );
        }
    }
    println!(
        "  Local IP:   {}",
        status.host.local_ip.as_deref().unwrap_or(absent)
    );
    println!(
        "  Public IP:  {}",
        status.host.public_ip.as_deref().unwrap_or(absent)
    );
}

/// `watch` -- run the engine until interrupted, printing observed changes.
pub fn watch(service: String, app: &AppConfig) -> Result<()> {
    println!("Watching \"{service}\" (Ctrl-C to stop)");

    let source: Arc<dyn StatusSource> = Arc::new(Scutil::new(app.command_timeout()));
    let monitor = Monitor::start(source, service, app.monitor_config());

    let mut last: Option<MonitorStatus> = None;
    loop {
        let current = monitor.status();
        if last.as_ref() != Some(&current) {
            println!("[{}] {}", Local::now().format("%H:%M:%S"), watch_line(&current));
            last = Some(current);
        }
        thread::sleep(constants::WATCH_REFRESH);
    }
}

/// One line of watch output, menu-bar-label style: state first, then every
/// address currently known.
fn watch_line(status: &MonitorStatus) -> String {
    let mut parts = vec![status.state.to_string()];
    if let Some(ip) = &status.tunnel_ip {
        match &status.interface {
            Some(interface) => parts.push(format!("tunnel {ip} via {interface}")),
            None => parts.push(format!("tunnel {ip}")),
        }
    }
    if let Some(ip) = &status.host.local_ip {
        parts.push(format!("local {ip}"));
    }
    if let Some(ip) = &status.host.public_ip {
        parts.push(format!("public {ip}"));
    }
    parts.join(" | ")
}

/// `connect` -- start the service, wait out the settle delay, re-observe.
pub fn connect(service: &str, app: &AppConfig) -> Result<()> {
    let source = Scutil::new(app.command_timeout());
    source.start(service);
    thread::sleep(app.monitor_config().settle_delay);
    print_status(&observe_once(&source, service, app));
    Ok(())
}

/// `disconnect` -- stop the service and re-observe.
///
/// A one-shot stop cannot fight an on-demand reconnect after the process
/// exits; that is watch mode's job.
pub fn disconnect(service: &str, app: &AppConfig) -> Result<()> {
    let source = Scutil::new(app.command_timeout());
    source.stop(service);
    thread::sleep(app.monitor_config().settle_delay);
    print_status(&observe_once(&source, service, app));
    if app.enforce_disconnect {
        println!("note: run `{} watch` to keep enforcing the disconnect", constants::APP_NAME);
    }
    Ok(())
}

/// `services` -- list registered VPN services, marking the configured one.
pub fn services(app: &AppConfig, configured: Option<&str>) -> Result<()> {
    let source = Scutil::new(app.command_timeout());
    let names = vpn::list_services(&source);

    if names.is_empty() {
        println!("No VPN services found.");
        return Ok(());
    }
    for name in names {
        let marker = if Some(name.as_str()) == configured {
            "*"
        } else {
            " "
        };
        println!("{marker} {name}");
    }
    Ok(())
}

/// `use <name>` -- persist the monitored service selection.
pub fn use_service(config_dir: &Path, app: &mut AppConfig, name: &str) -> Result<()> {
    let source = Scutil::new(app.command_timeout());
    let names = vpn::list_services(&source);

    // Validate against the live list when one is available; with no list
    // (e.g. the command is missing) take the name on faith.
    if !names.is_empty() && !names.iter().any(|n| n == name) {
        return Err(eyre!(
            "unknown service \"{name}\"; available: {}",
            names.join(", ")
        ));
    }

    app.service_name = name.to_string();
    config::save_config(config_dir, app).map_err(|e| eyre!(e))?;
    println!("Monitoring \"{name}\" from now on.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_line_connected_full() {
        let status = MonitorStatus {
            service: "svc".to_string(),
            state: VpnState::Connected,
            tunnel_ip: Some("100.64.100.2".to_string()),
            interface: Some("utun4".to_string()),
            since: None,
            host: HostNetworkInfo {
                local_ip: Some("192.168.1.20".to_string()),
                public_ip: Some("203.0.113.7".to_string()),
            },
            wants_connected: true,
        };
        assert_eq!(
            watch_line(&status),
            "Connected | tunnel 100.64.100.2 via utun4 | local 192.168.1.20 | public 203.0.113.7"
        );
    }

    #[test]
    fn test_watch_line_disconnected_minimal() {
        let status = MonitorStatus {
            state: VpnState::Disconnected,
            ..MonitorStatus::default()
        };
        assert_eq!(watch_line(&status), "Disconnected");
    }

    #[test]
    fn test_watch_line_tunnel_without_interface() {
        let status = MonitorStatus {
            state: VpnState::Connected,
            tunnel_ip: Some("10.8.0.6".to_string()),
            ..MonitorStatus::default()
        };
        assert_eq!(watch_line(&status), "Connected | tunnel 10.8.0.6");
    }
}
