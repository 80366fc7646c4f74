#![allow(dead_code)]

use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::rdata::{A, SOA};
use hickory_proto::rr::{Name, RData, Record, RecordType};
use std::net::Ipv4Addr;
use std::str::FromStr;

pub fn query_message(id: u16, name: &str, record_type: RecordType) -> Message {
    let mut message = Message::new(id, MessageType::Query, OpCode::Query);
    message.add_query(Query::query(Name::from_str(name).unwrap(), record_type));
    message
}

pub fn query_bytes(id: u16, name: &str, record_type: RecordType) -> Vec<u8> {
    query_message(id, name, record_type).to_vec().unwrap()
}

pub fn soa_record(zone: &str, serial: u32) -> Record {
    Record::from_rdata(
        Name::from_str(zone).unwrap(),
        3600,
        RData::SOA(SOA::new(
            Name::from_str(&format!("ns1.{}", zone)).unwrap(),
            Name::from_str(&format!("hostmaster.{}", zone)).unwrap(),
            serial,
            3600,
            600,
            86400,
            300,
        )),
    )
}

pub fn a_record(name: &str, ip: Ipv4Addr) -> Record {
    Record::from_rdata(Name::from_str(name).unwrap(), 300, RData::A(A(ip)))
}

/// IPv4 answers of a wire response, in order.
pub fn answer_ips(bytes: &[u8]) -> Vec<Ipv4Addr> {
    Message::from_vec(bytes)
        .unwrap()
        .answers()
        .iter()
        .filter_map(|record| match record.data() {
            RData::A(a) => Some(a.0),
            _ => None,
        })
        .collect()
}
