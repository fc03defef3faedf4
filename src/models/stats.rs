use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::user::as_i64_lenient;

/// Panel `/api/system/stats` payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStats {
    pub cpu: CpuStats,
    pub memory: MemoryStats,
    #[serde(default)]
    pub uptime: f64,
    #[serde(default)]
    pub timestamp: i64,
    pub users: UsersStats,
    pub online_stats: OnlineStats,
    pub nodes: NodesStats,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CpuStats {
    pub cores: i64,
    pub physical_cores: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryStats {
    pub total: i64,
    pub free: i64,
    pub used: i64,
    pub active: i64,
    pub available: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsersStats {
    pub status_counts: StatusCounts,
    #[serde(default)]
    pub total_users: i64,
    /// The panel reports this as a string; kept verbatim for the frontend.
    #[serde(default = "zero_string", deserialize_with = "string_or_number")]
    pub total_traffic_bytes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", default)]
pub struct StatusCounts {
    pub active: i64,
    pub disabled: i64,
    pub limited: i64,
    pub expired: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OnlineStats {
    pub last_day: i64,
    pub last_week: i64,
    pub never_online: i64,
    pub online_now: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodesStats {
    pub total_online: i64,
}

fn zero_string() -> String {
    "0".to_string()
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(zero_string()),
        other => Err(serde::de::Error::custom(format!("expected string or number, got {}", other))),
    }
}

/// Aggregated user counters shown on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UsageStats {
    pub total_users: i64,
    pub active_users: i64,
    pub disabled_users: i64,
    pub limited_users: i64,
    pub expired_users: i64,
    pub total_traffic: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub system: Option<SystemStats>,
    pub usage: UsageStats,
}

impl SystemStats {
    pub fn from_panel(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

impl UsageStats {
    pub fn from_system(system: &SystemStats) -> Self {
        let users = &system.users;
        Self {
            total_users: users.total_users,
            active_users: users.status_counts.active,
            disabled_users: users.status_counts.disabled,
            limited_users: users.status_counts.limited,
            expired_users: users.status_counts.expired,
            total_traffic: users.total_traffic_bytes.trim().parse().unwrap_or(0),
        }
    }

    /// Count users one by one when system stats are unavailable.
    pub fn from_users(users: &[Value]) -> Self {
        let mut usage = Self {
            total_users: users.len() as i64,
            ..Self::default()
        };

        for user in users {
            let status = user.get("status").and_then(Value::as_str).unwrap_or("");
            match status.to_ascii_uppercase().as_str() {
                "ACTIVE" => usage.active_users += 1,
                "DISABLED" | "INACTIVE" => usage.disabled_users += 1,
                "LIMITED" => usage.limited_users += 1,
                "EXPIRED" => usage.expired_users += 1,
                _ => {}
            }
            usage.total_traffic += used_traffic(user);
        }

        usage
    }
}

fn used_traffic(user: &Value) -> i64 {
    user.pointer("/userTraffic/usedTrafficBytes")
        .filter(|v| !v.is_null())
        .or_else(|| user.get("usedTrafficBytes"))
        .and_then(as_i64_lenient)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn system_payload() -> Value {
        json!({
            "cpu": {"cores": 4, "physicalCores": 2},
            "memory": {"total": 8, "free": 2, "used": 6, "active": 5, "available": 3},
            "uptime": 1234.5,
            "timestamp": 1700000000,
            "users": {
                "statusCounts": {"ACTIVE": 10, "DISABLED": 2, "LIMITED": 1, "EXPIRED": 3},
                "totalUsers": 16,
                "totalTrafficBytes": "987654321"
            },
            "onlineStats": {"lastDay": 5, "lastWeek": 9, "neverOnline": 1, "onlineNow": 2},
            "nodes": {"totalOnline": 3}
        })
    }

    #[test]
    fn usage_from_system_stats() {
        let system = SystemStats::from_panel(system_payload()).unwrap();
        let usage = UsageStats::from_system(&system);
        assert_eq!(
            usage,
            UsageStats {
                total_users: 16,
                active_users: 10,
                disabled_users: 2,
                limited_users: 1,
                expired_users: 3,
                total_traffic: 987654321,
            }
        );
    }

    #[test]
    fn numeric_traffic_total_is_accepted() {
        let mut payload = system_payload();
        payload["users"]["totalTrafficBytes"] = json!(42);
        let system = SystemStats::from_panel(payload).unwrap();
        assert_eq!(system.users.total_traffic_bytes, "42");
        assert_eq!(UsageStats::from_system(&system).total_traffic, 42);
    }

    #[test]
    fn unparseable_traffic_total_counts_as_zero() {
        let mut payload = system_payload();
        payload["users"]["totalTrafficBytes"] = json!("lots");
        let system = SystemStats::from_panel(payload).unwrap();
        assert_eq!(UsageStats::from_system(&system).total_traffic, 0);
    }

    #[test]
    fn incomplete_system_stats_fail_to_parse() {
        assert!(SystemStats::from_panel(json!({"cpu": {}})).is_err());
        assert!(SystemStats::from_panel(json!({})).is_err());
    }

    #[test]
    fn usage_from_users_handles_both_traffic_layouts() {
        let users = vec![
            json!({"status": "ACTIVE", "usedTrafficBytes": 100}),
            json!({"status": "active", "userTraffic": {"usedTrafficBytes": 50}}),
            json!({"status": "INACTIVE", "usedTrafficBytes": "25"}),
            json!({"status": "LIMITED"}),
            json!({"status": "EXPIRED", "userTraffic": {"usedTrafficBytes": null}, "usedTrafficBytes": 5}),
        ];
        let usage = UsageStats::from_users(&users);
        assert_eq!(
            usage,
            UsageStats {
                total_users: 5,
                active_users: 2,
                disabled_users: 1,
                limited_users: 1,
                expired_users: 1,
                total_traffic: 180,
            }
        );
    }
}
