//! Origin metadata attached to audit rows.

use actix_web::{HttpRequest, http::header::USER_AGENT};
use db::dtos::audit_log::AuditTrail;

pub const MAX_USER_AGENT_LEN: usize = 255;
pub const MAX_IP_LEN: usize = 45;

/// Builds the audit trail for a mutation performed by `actor_id` during `req`.
pub fn trail(req: &HttpRequest, actor_id: Option<i64>) -> AuditTrail {
    let ip_address = req
        .connection_info()
        .realip_remote_addr()
        .map(strip_port)
        .map(|ip| truncate(ip, MAX_IP_LEN).to_string());

    let user_agent = req
        .headers()
        .get(USER_AGENT)
        .map(|ua| String::from_utf8_lossy(ua.as_bytes()).into_owned())
        .unwrap_or_default();

    AuditTrail {
        actor_id,
        ip_address,
        user_agent: Some(truncate(&user_agent, MAX_USER_AGENT_LEN).to_string()),
    }
}

/// `realip_remote_addr` may carry a port (`1.2.3.4:5678`, `[::1]:5678`).
fn strip_port(addr: &str) -> &str {
    if let Some(rest) = addr.strip_prefix('[') {
        return rest.split(']').next().unwrap_or(rest);
    }
    match addr.rsplit_once(':') {
        // a single colon means host:port, more than one is a bare IPv6 address
        Some((host, port)) if !host.contains(':') && port.chars().all(|c| c.is_ascii_digit()) => {
            host
        }
        _ => addr,
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn extracts_peer_ip_and_user_agent() {
        let req = TestRequest::default()
            .peer_addr("10.1.2.3:40000".parse().unwrap())
            .insert_header((USER_AGENT, "Mozilla/5.0"))
            .to_http_request();

        let trail = trail(&req, Some(4));
        assert_eq!(trail.actor_id, Some(4));
        assert_eq!(trail.ip_address.as_deref(), Some("10.1.2.3"));
        assert_eq!(trail.user_agent.as_deref(), Some("Mozilla/5.0"));
    }

    #[test]
    fn forwarded_header_wins_over_peer() {
        let req = TestRequest::default()
            .peer_addr("10.1.2.3:40000".parse().unwrap())
            .insert_header(("x-forwarded-for", "203.0.113.9"))
            .to_http_request();

        assert_eq!(trail(&req, None).ip_address.as_deref(), Some("203.0.113.9"));
    }

    #[test]
    fn user_agent_is_truncated_on_a_char_boundary() {
        let long = "é".repeat(300);
        let req = TestRequest::default()
            .insert_header((USER_AGENT, long.as_str()))
            .to_http_request();

        let ua = trail(&req, None).user_agent.unwrap();
        assert_eq!(ua.chars().count(), MAX_USER_AGENT_LEN);
    }

    #[test]
    fn missing_user_agent_is_empty() {
        let req = TestRequest::default().to_http_request();
        assert_eq!(trail(&req, None).user_agent.as_deref(), Some(""));
    }

    #[test]
    fn strips_ports() {
        assert_eq!(strip_port("127.0.0.1:8080"), "127.0.0.1");
        assert_eq!(strip_port("127.0.0.1"), "127.0.0.1");
        assert_eq!(strip_port("[::1]:8080"), "::1");
        assert_eq!(strip_port("::1"), "::1");
        assert_eq!(strip_port("2001:db8::1"), "2001:db8::1");
    }
}
