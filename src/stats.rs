use tracing::info;

/// Diagnostic counters of a module. They are only ever incremented, and only reset by creating a
///  new module.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct AckStats {
    /// ACKs older than the highest ACK received so far
    pub num_old_dup_acks: u64,
    /// ACKs repeating the highest ACK received so far, i.e. signalling a lost segment
    pub num_dup_acks: u64,
    pub num_fast_retrans: u64,
    pub num_timeout_retrans: u64,
    pub num_ack_sends: u64,

    /// ACKs that were not sent because the ACK segment pool was empty
    pub num_ack_skips: u64,
    /// retransmissions actually posted from the resend queue
    pub num_resends: u64,
    /// first transmissions of data segments
    pub num_data_sends: u64,
}

impl AckStats {
    pub fn log_report(&self, label: &str) {
        info!(
            "{}: data sends {}, resends {} (timeout {}, fast {}), ACK sends {} (skipped {}), dup ACKs {}, old dup ACKs {}",
            label,
            self.num_data_sends,
            self.num_resends,
            self.num_timeout_retrans,
            self.num_fast_retrans,
            self.num_ack_sends,
            self.num_ack_skips,
            self.num_dup_acks,
            self.num_old_dup_acks,
        );
    }
}
