//! Boot sequencer: the one-shot decision between "go online as a client"
//! and "become configurable".
//!
//! There is no retry at this layer. A failed attempt hands control to the
//! config portal, whose only exit is a device restart, which re-enters this
//! sequencer from power-on state.

use crate::net::{AccessPoint, Restart, Station};
use crate::portal::ConfigPortal;
use crate::station;
use crate::store::{ConfigStore, StoreError};
use log::info;

/// Load the stored record and try to get online.
///
/// Returns `Ok(())` once the device is connected as a station; the caller
/// then owns normal operation (the light loop). If the connect attempt
/// fails in any way, control passes to the portal and never comes back.
///
/// A config file that exists but cannot be parsed is surfaced as an error;
/// it is never silently replaced with defaults.
pub fn run<R>(
    radio: &mut R,
    restart: &impl Restart,
    store: &ConfigStore,
    portal: ConfigPortal,
) -> Result<(), StoreError>
where
    R: Station + AccessPoint,
{
    let mut config = store.load()?;

    let outcome = station::connect(radio, &mut config, store)?;
    if outcome.is_online() {
        info!("online, leaving provisioning");
        return Ok(());
    }

    info!("not online ({:?}), starting config portal", outcome);
    portal.run(radio, restart, config, store)
}
