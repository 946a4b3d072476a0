/*!
 * Status Mapping Tests
 * Transport status codes to errno
 */

use posix9::core::Errno;
use posix9::net::errmap::status_name;
use posix9::net::{ot_to_errno, OtStatus, SocketError, STATUS_TABLE};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

#[test]
fn test_table_is_consistent_with_lookup() {
    for (status, name, errno) in STATUS_TABLE {
        assert_eq!(ot_to_errno(*status), *errno, "{}", name);
        assert_eq!(status_name(*status), Some(*name));
    }
}

#[test]
fn test_only_success_codes_map_to_none() {
    let successes: Vec<&str> = STATUS_TABLE
        .iter()
        .filter(|(_, _, errno)| errno.is_none())
        .map(|(_, name, _)| *name)
        .collect();
    assert_eq!(successes, vec!["NoError", "NoUnitData"]);
}

#[test]
fn test_unix_style_codes_keep_their_meaning() {
    assert_eq!(ot_to_errno(OtStatus::K_ECONNRESET), Some(Errno::ECONNRESET));
    assert_eq!(ot_to_errno(OtStatus::K_EPIPE), Some(Errno::EPIPE));
    assert_eq!(ot_to_errno(OtStatus::K_EINPROGRESS), Some(Errno::EINPROGRESS));
    assert_eq!(ot_to_errno(OtStatus::K_EWOULDBLOCK), Some(Errno::EWOULDBLOCK));
}

#[test]
fn test_transport_errors_surface_mapped_errno() {
    assert_eq!(
        SocketError::Transport(OtStatus::ADDRESS_BUSY).errno(),
        Errno::EADDRINUSE
    );
    assert_eq!(SocketError::Transport(OtStatus(-1)).errno(), Errno::EIO);
    // A success code wrapped as an error still reports a failure
    assert_eq!(SocketError::Transport(OtStatus::NO_ERROR).errno(), Errno::EIO);
}

proptest! {
    #[test]
    fn prop_mapping_is_total(code in any::<i32>()) {
        let status = OtStatus(code);
        let known = STATUS_TABLE.iter().any(|(s, _, _)| *s == status);
        match ot_to_errno(status) {
            None => prop_assert!(known),
            Some(errno) => {
                prop_assert!(errno.code() > 0);
                if !known {
                    prop_assert_eq!(errno, Errno::EIO);
                }
            }
        }
    }

    #[test]
    fn prop_unknown_codes_have_no_name(code in -3100i32..0) {
        prop_assert_eq!(status_name(OtStatus(code)), None);
        prop_assert_eq!(ot_to_errno(OtStatus(code)), Some(Errno::EIO));
    }
}
