//! Mapping from `hickory_proto::rr::RecordType` to `ferrous_rproxy_domain::RecordType`.

use ferrous_rproxy_domain::RecordType;
use hickory_proto::rr::RecordType as HickoryRecordType;

pub struct RecordTypeMapper;

impl RecordTypeMapper {
    /// Every code has a domain counterpart; unknown ones are carried as
    /// `Other` so they can still be proxied.
    pub fn from_hickory(hickory_type: HickoryRecordType) -> RecordType {
        RecordType::from_u16(u16::from(hickory_type))
    }
}
