use log::info;

use crate::config::Settings;
use crate::error::Result;
use crate::provider::dynect::{DynClient, Lookup, RecordPath};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Updated(RecordPath),
}

/// Log in, create or update the CNAME, then publish the zone. Stops at the
/// first failure; a record written before a failed publish stays pending on
/// the Dyn side.
pub async fn publish_cname(settings: &Settings) -> Result<Outcome> {
    let session = DynClient::new(settings)?
        .authenticate(&settings.credentials)
        .await?;

    let outcome = match session
        .lookup_record(&settings.zone, &settings.fqdn)
        .await?
    {
        Lookup::NotFound => {
            session
                .create_record(&settings.zone, &settings.fqdn, &settings.host)
                .await?;
            Outcome::Created
        }
        Lookup::Found(record) => {
            session.update_record(&record, &settings.host).await?;
            Outcome::Updated(record)
        }
    };

    session.publish(&settings.zone).await?;
    info!("Published zone {} ({:?})", settings.zone, outcome);

    Ok(outcome)
}

pub fn confirmation(settings: &Settings) -> String {
    format!("Updated CNAME for {} to {}", settings.fqdn, settings.host)
}
