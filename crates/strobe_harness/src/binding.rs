//! Named bindings for valid/ready/data interface groups.
//!
//! A [`StreamBinding`] resolves the three wires of one stream interface —
//! `<prefix>valid`, `<prefix>ready`, `<prefix>data` — to typed signal
//! handles exactly once, validating shape eagerly so protocol code never
//! deals with missing or mis-sized signals.

use strobe_sim::{SignalId, Surface};

use crate::error::HarnessError;

/// Resolved handles for one stream interface on a device surface.
#[derive(Clone, Debug)]
pub struct StreamBinding {
    prefix: String,
    valid: SignalId,
    ready: SignalId,
    data: SignalId,
    width: u32,
}

impl StreamBinding {
    /// Resolves `<prefix>valid`, `<prefix>ready`, and `<prefix>data` on the
    /// given surface.
    ///
    /// Fails with a configuration error if any of the three signals is
    /// absent, if a handshake wire is not 1 bit wide, or if `data` is wider
    /// than 64 bits (transaction values are machine integers at the API).
    pub fn bind(surface: &Surface, prefix: &str) -> Result<Self, HarnessError> {
        let valid = resolve(surface, prefix, "valid")?;
        let ready = resolve(surface, prefix, "ready")?;
        let data = resolve(surface, prefix, "data")?;

        expect_width(surface, prefix, valid, 1)?;
        expect_width(surface, prefix, ready, 1)?;

        let width = surface.width(data);
        if width == 0 || width > 64 {
            return Err(HarnessError::Configuration {
                prefix: prefix.to_string(),
                signal: surface.name(data).to_string(),
                reason: format!("has width {width}, but transaction data must be 1..=64 bits"),
            });
        }

        Ok(Self {
            prefix: prefix.to_string(),
            valid,
            ready,
            data,
            width,
        })
    }

    /// The interface prefix this binding was resolved from.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The bit width of the `data` signal, used for masking.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// The `valid` wire.
    pub fn valid(&self) -> SignalId {
        self.valid
    }

    /// The `ready` wire.
    pub fn ready(&self) -> SignalId {
        self.ready
    }

    /// The `data` bus.
    pub fn data(&self) -> SignalId {
        self.data
    }
}

fn resolve(surface: &Surface, prefix: &str, role: &str) -> Result<SignalId, HarnessError> {
    let name = format!("{prefix}{role}");
    surface
        .lookup(&name)
        .ok_or_else(|| HarnessError::Configuration {
            prefix: prefix.to_string(),
            signal: name,
            reason: "is not present on the device surface".to_string(),
        })
}

fn expect_width(
    surface: &Surface,
    prefix: &str,
    id: SignalId,
    expected: u32,
) -> Result<(), HarnessError> {
    let width = surface.width(id);
    if width != expected {
        return Err(HarnessError::Configuration {
            prefix: prefix.to_string(),
            signal: surface.name(id).to_string(),
            reason: format!("has width {width}, expected {expected}"),
        });
    }
    Ok(())
}
