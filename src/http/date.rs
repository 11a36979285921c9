use std::time::{SystemTime, UNIX_EPOCH};

const WDAYS: [&[u8; 3]; 7] = [b"Sun", b"Mon", b"Tue", b"Wed", b"Thu", b"Fri", b"Sat"];
const MONTHS: [&[u8; 3]; 12] = [
    b"Jan", b"Feb", b"Mar", b"Apr", b"May", b"Jun", b"Jul", b"Aug", b"Sep", b"Oct", b"Nov", b"Dec",
];

/// Format an [IMF-fixdate][rfc] (`Sun, 06 Nov 1994 08:49:37 GMT`) for the
/// given time.
///
/// Times before the unix epoch clamp to the epoch.
///
/// [rfc]: <https://datatracker.ietf.org/doc/html/rfc9110#section-5.6.7>
pub fn httpdate(v: SystemTime) -> [u8; 29] {
    let secs = match v.duration_since(UNIX_EPOCH) {
        Ok(dur) => dur.as_secs(),
        Err(_) => 0,
    };

    let days = (secs / 86400) as i64;
    let secs_of_day = secs % 86400;

    // 1970-01-01 was a Thursday
    let wday = ((days + 4) % 7) as usize;

    // days-to-civil, era based
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);

    let mut buf: [u8; 29] = *b"Sun, 00 Jan 0000 00:00:00 GMT";
    buf[..3].copy_from_slice(WDAYS[wday]);
    write2(&mut buf, 5, day as u64);
    buf[8..11].copy_from_slice(MONTHS[month as usize - 1]);
    write2(&mut buf, 12, (year / 100) as u64);
    write2(&mut buf, 14, (year % 100) as u64);
    write2(&mut buf, 17, secs_of_day / 3600);
    write2(&mut buf, 20, secs_of_day % 3600 / 60);
    write2(&mut buf, 23, secs_of_day % 60);
    buf
}

fn write2(buf: &mut [u8; 29], at: usize, value: u64) {
    buf[at] = b'0' + (value / 10 % 10) as u8;
    buf[at + 1] = b'0' + (value % 10) as u8;
}

#[cfg(test)]
mod test {
    use super::*;
    use std::time::Duration;

    #[test]
    fn formats_known_dates() {
        assert_eq!(&httpdate(UNIX_EPOCH), b"Thu, 01 Jan 1970 00:00:00 GMT");

        // RFC 9110's example date
        let rfc = UNIX_EPOCH + Duration::from_secs(784_111_777);
        assert_eq!(&httpdate(rfc), b"Sun, 06 Nov 1994 08:49:37 GMT");

        // leap day
        let leap = UNIX_EPOCH + Duration::from_secs(951_782_400);
        assert_eq!(&httpdate(leap), b"Tue, 29 Feb 2000 00:00:00 GMT");
    }
}
