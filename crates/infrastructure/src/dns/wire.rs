//! Decoding of client queries and construction of failure responses.

use crate::dns::forwarding::RecordTypeMapper;
use ferrous_rproxy_domain::{DnsQuery, DnsQuestion, DomainError};
use hickory_proto::op::{Message, MessageType, OpCode, ResponseCode};

/// A client message decoded once: the hickory view for building responses,
/// the domain view for routing.
pub struct DecodedQuery {
    pub message: Message,
    pub query: DnsQuery,
}

pub fn decode_query(bytes: &[u8]) -> Result<DecodedQuery, DomainError> {
    let message = Message::from_vec(bytes)
        .map_err(|e| DomainError::MalformedQuery(format!("undecodable message: {}", e)))?;

    if message.message_type() != MessageType::Query {
        return Err(DomainError::MalformedQuery(
            "message is not a query".to_string(),
        ));
    }

    let questions = message
        .queries()
        .iter()
        .map(|q| {
            DnsQuestion::new(
                &q.name().to_ascii(),
                RecordTypeMapper::from_hickory(q.query_type()),
            )
        })
        .collect();

    let query = DnsQuery::new(message.id(), questions);
    Ok(DecodedQuery { message, query })
}

/// SERVFAIL carrying the request's id, opcode, RD flag and question section.
pub fn servfail_response(request: &Message) -> Option<Vec<u8>> {
    let mut response = Message::error_msg(request.id(), request.op_code(), ResponseCode::ServFail);
    response.set_recursion_desired(request.recursion_desired());
    response.add_queries(request.queries().iter().cloned());
    response.to_vec().ok()
}

/// SERVFAIL for raw bytes that may not decode. Falls back to echoing just
/// the id when only the header survives; nothing is sent without one.
pub fn servfail_for_bytes(bytes: &[u8]) -> Option<Vec<u8>> {
    if let Ok(message) = Message::from_vec(bytes) {
        return servfail_response(&message);
    }

    let id = message_id(bytes)?;
    Message::error_msg(id, OpCode::Query, ResponseCode::ServFail)
        .to_vec()
        .ok()
}

/// Message id of a raw DNS message.
pub fn message_id(bytes: &[u8]) -> Option<u16> {
    Some(u16::from_be_bytes([*bytes.first()?, *bytes.get(1)?]))
}
