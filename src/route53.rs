use aws_sdk_route53::error::DisplayErrorContext;
use aws_sdk_route53::types::RrType;
use aws_sdk_route53::Client;

use crate::aws;
use crate::config::DeployConfig;
use crate::error::{DeployError, Result};

/// A resource record set, detached from the SDK types.
#[derive(Debug, Clone)]
pub struct DomainRecord {
    pub name: String,
    pub record_type: String,
    pub ttl: Option<i64>,
    pub values: Vec<String>,
}

#[derive(Debug)]
pub enum DomainCheck {
    NotFound,
    Found {
        zone_id: String,
        record: Option<DomainRecord>,
    },
}

pub async fn run(config: &DeployConfig) -> Result<()> {
    let domain = config.require_domain()?;
    let sdk = aws::sdk_config(config).await;
    let client = Client::new(&sdk);
    match verify_domain(&client, domain, config.route53_hosted_zone_id.as_deref()).await? {
        DomainCheck::NotFound => {
            println!("Domain {domain} not found in Route 53");
        }
        DomainCheck::Found { zone_id, record } => {
            println!("Hosted zone: {zone_id}");
            match record {
                Some(record) => {
                    println!(
                        "{} {} TTL={} -> {}",
                        record.name,
                        record.record_type,
                        record
                            .ttl
                            .map(|ttl| ttl.to_string())
                            .unwrap_or_else(|| "-".to_string()),
                        record.values.join(", ")
                    );
                }
                None => println!("No A record found for {domain}"),
            }
        }
    }
    Ok(())
}

/// Read-only lookup: the hosted zone whose name matches `domain`, then the
/// zone's A record set starting at `domain`, limited to one result. A
/// configured zone id skips the by-name search.
pub async fn verify_domain(
    client: &Client,
    domain: &str,
    zone_id: Option<&str>,
) -> Result<DomainCheck> {
    let zone_id = match zone_id {
        Some(id) => Some(normalize_zone_id(id)),
        None => find_zone(client, domain).await?,
    };
    let Some(zone_id) = zone_id else {
        return Ok(DomainCheck::NotFound);
    };

    let response = client
        .list_resource_record_sets()
        .hosted_zone_id(&zone_id)
        .start_record_name(domain)
        .start_record_type(RrType::A)
        .max_items(1)
        .send()
        .await
        .map_err(|err| {
            DeployError::Verification(format!(
                "list records for {domain}: {}",
                DisplayErrorContext(&err)
            ))
        })?;

    let record = response
        .resource_record_sets()
        .first()
        .map(|set| DomainRecord {
            name: set.name().to_string(),
            record_type: set.r#type().as_str().to_string(),
            ttl: set.ttl(),
            values: set
                .resource_records()
                .iter()
                .map(|record| record.value().to_string())
                .collect(),
        });
    Ok(DomainCheck::Found { zone_id, record })
}

async fn find_zone(client: &Client, domain: &str) -> Result<Option<String>> {
    let response = client
        .list_hosted_zones_by_name()
        .dns_name(domain)
        .send()
        .await
        .map_err(|err| {
            DeployError::Verification(format!(
                "list hosted zones for {domain}: {}",
                DisplayErrorContext(&err)
            ))
        })?;
    Ok(response
        .hosted_zones()
        .iter()
        .find(|zone| zone_matches(zone.name(), domain))
        .map(|zone| normalize_zone_id(zone.id())))
}

// Zone names come back with a trailing dot; ids with a "/hostedzone/" prefix.
fn zone_matches(zone_name: &str, domain: &str) -> bool {
    zone_name.trim_end_matches('.') == domain.trim_end_matches('.')
}

fn normalize_zone_id(id: &str) -> String {
    id.trim_start_matches("/hostedzone/").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_names_match_ignoring_trailing_dot() {
        assert!(zone_matches("example.com.", "example.com"));
        assert!(zone_matches("example.com", "example.com."));
        assert!(!zone_matches("sub.example.com.", "example.com"));
    }

    #[test]
    fn zone_id_prefix_is_stripped() {
        assert_eq!(normalize_zone_id("/hostedzone/Z123"), "Z123");
        assert_eq!(normalize_zone_id("Z123"), "Z123");
    }
}
