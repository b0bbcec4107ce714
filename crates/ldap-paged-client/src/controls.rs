//! Simple paged results control (RFC 2696)

use ldap3::controls::{Control, ControlType, PagedResults, RawControl};

/// Build the paged results request control.
///
/// A `size` of 0 together with the cookie of an unfinished search asks the
/// server to discard that search's state.
pub fn paged_control(size: u32, cookie: Option<&[u8]>) -> RawControl {
    PagedResults {
        size: i32::try_from(size).unwrap_or(i32::MAX),
        cookie: cookie.map(<[u8]>::to_vec).unwrap_or_default(),
    }
    .into()
}

/// Extract the cookie for the next page from the response controls.
///
/// Returns `None` when the control is absent or its cookie is empty, which
/// means the search is complete.
pub fn next_cookie(ctrls: &[Control]) -> Option<Vec<u8>> {
    ctrls
        .iter()
        .find_map(|Control(ctype, raw)| match ctype {
            Some(ControlType::PagedResults) if raw.val.is_some() => {
                Some(raw.parse::<PagedResults>().cookie)
            }
            _ => None,
        })
        .filter(|cookie| !cookie.is_empty())
}
