use hickory_proto::op::{Message, ResponseCode};
use hickory_proto::rr::{RData, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    Axfr,
    Ixfr,
}

/// Follows the SOA records of a transfer stream to find where it ends.
///
/// AXFR: `SOA(S) ... SOA`. IXFR: a lone `SOA(S)` means the client is up to
/// date; `SOA(S) <non-SOA> ... SOA(S)` is a full-zone reply; otherwise the
/// stream is a sequence of difference blocks closed by the third `SOA(S)`.
#[derive(Debug)]
pub struct TransferTracker {
    kind: TransferKind,
    serial: Option<u32>,
    records_seen: usize,
    soa_seen: usize,
    serial_seen: usize,
    full_zone: bool,
    complete: bool,
}

impl TransferTracker {
    pub fn new(kind: TransferKind) -> Self {
        Self {
            kind,
            serial: None,
            records_seen: 0,
            soa_seen: 0,
            serial_seen: 0,
            full_zone: false,
            complete: false,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn records_seen(&self) -> usize {
        self.records_seen
    }

    /// Feeds one message of the stream. Returns `Ok(true)` once the
    /// transfer is complete.
    pub fn observe(&mut self, message: &Message) -> Result<bool, String> {
        if message.response_code() != ResponseCode::NoError {
            return Err(format!("backend answered {}", message.response_code()));
        }

        let first_message = self.records_seen == 0;

        for record in message.answers() {
            if self.complete {
                break;
            }
            self.observe_record(record)?;
        }

        if first_message && self.records_seen == 0 {
            return Err("empty transfer message".to_string());
        }

        if first_message
            && self.kind == TransferKind::Ixfr
            && message.answers().len() == 1
            && self.soa_seen == 1
        {
            self.complete = true;
        }

        Ok(self.complete)
    }

    fn observe_record(&mut self, record: &Record) -> Result<(), String> {
        let serial = soa_serial(record);
        self.records_seen += 1;

        if self.records_seen == 1 {
            let serial = serial.ok_or_else(|| {
                format!("transfer starts with {} instead of SOA", record.record_type())
            })?;
            self.serial = Some(serial);
            self.soa_seen = 1;
            self.serial_seen = 1;
            return Ok(());
        }

        if self.records_seen == 2 {
            self.full_zone = serial.is_none();
        }

        let Some(serial) = serial else {
            return Ok(());
        };

        self.soa_seen += 1;
        if Some(serial) == self.serial {
            self.serial_seen += 1;
        }

        self.complete = match self.kind {
            TransferKind::Axfr => self.soa_seen >= 2,
            TransferKind::Ixfr if self.full_zone => self.serial_seen >= 2,
            TransferKind::Ixfr => self.serial_seen >= 3,
        };

        Ok(())
    }
}

fn soa_serial(record: &Record) -> Option<u32> {
    match record.data() {
        RData::SOA(soa) => Some(soa.serial()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hickory_proto::op::OpCode;
    use hickory_proto::rr::rdata::{A, SOA};
    use hickory_proto::rr::Name;
    use std::net::Ipv4Addr;

    fn zone() -> Name {
        Name::from_ascii("example.com.").unwrap()
    }

    fn soa(serial: u32) -> Record {
        Record::from_rdata(
            zone(),
            3600,
            RData::SOA(SOA::new(
                Name::from_ascii("ns1.example.com.").unwrap(),
                Name::from_ascii("hostmaster.example.com.").unwrap(),
                serial,
                3600,
                600,
                86400,
                300,
            )),
        )
    }

    fn a(last: u8) -> Record {
        Record::from_rdata(zone(), 300, RData::A(A(Ipv4Addr::new(192, 0, 2, last))))
    }

    fn message(records: Vec<Record>) -> Message {
        let mut message = Message::response(1, OpCode::Query);
        for record in records {
            message.add_answer(record);
        }
        message
    }

    #[test]
    fn test_axfr_single_message() {
        let mut tracker = TransferTracker::new(TransferKind::Axfr);
        let done = tracker.observe(&message(vec![soa(5), a(1), a(2), soa(5)])).unwrap();
        assert!(done);
        assert_eq!(tracker.records_seen(), 4);
    }

    #[test]
    fn test_axfr_across_messages() {
        let mut tracker = TransferTracker::new(TransferKind::Axfr);
        assert!(!tracker.observe(&message(vec![soa(5), a(1)])).unwrap());
        assert!(!tracker.observe(&message(vec![a(2)])).unwrap());
        assert!(tracker.observe(&message(vec![a(3), soa(5)])).unwrap());
    }

    #[test]
    fn test_transfer_must_start_with_soa() {
        let mut tracker = TransferTracker::new(TransferKind::Axfr);
        assert!(tracker.observe(&message(vec![a(1), soa(5)])).is_err());
    }

    #[test]
    fn test_empty_first_message_fails() {
        let mut tracker = TransferTracker::new(TransferKind::Axfr);
        assert!(tracker.observe(&message(vec![])).is_err());
    }

    #[test]
    fn test_error_rcode_fails() {
        let mut tracker = TransferTracker::new(TransferKind::Axfr);
        let mut refused = message(vec![]);
        refused.set_response_code(ResponseCode::Refused);
        assert!(tracker.observe(&refused).is_err());
    }

    #[test]
    fn test_ixfr_up_to_date() {
        let mut tracker = TransferTracker::new(TransferKind::Ixfr);
        assert!(tracker.observe(&message(vec![soa(9)])).unwrap());
    }

    #[test]
    fn test_ixfr_full_zone_reply() {
        let mut tracker = TransferTracker::new(TransferKind::Ixfr);
        assert!(!tracker.observe(&message(vec![soa(9), a(1)])).unwrap());
        assert!(tracker.observe(&message(vec![a(2), soa(9)])).unwrap());
    }

    #[test]
    fn test_ixfr_incremental_reply() {
        // SOA(9) | SOA(7) -a SOA(8) +a | SOA(8) -a SOA(9) +a | SOA(9)
        let mut tracker = TransferTracker::new(TransferKind::Ixfr);
        let first = message(vec![soa(9), soa(7), a(1), soa(8), a(2)]);
        assert!(!tracker.observe(&first).unwrap());

        let second = message(vec![soa(8), a(2), soa(9), a(3)]);
        assert!(!tracker.observe(&second).unwrap());

        assert!(tracker.observe(&message(vec![soa(9)])).unwrap());
    }
}
