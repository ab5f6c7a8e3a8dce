use std::fmt::{Display, Formatter};
use std::io::{self, Write};

use bstr::ByteSlice;

use crate::aggregate::Aggregations;
use crate::measurement::StationStats;

/// `{a=min/mean/max, b=min/mean/max}` with stations in byte order.
pub struct Summary<'a>(pub &'a Aggregations);

impl Summary<'_> {
    fn sorted(&self) -> Vec<(&[u8], &StationStats)> {
        let mut stations: Vec<(&[u8], &StationStats)> = self
            .0
            .iter()
            .map(|(station, measurement)| (&station[..], measurement))
            .collect();
        stations.sort_unstable_by_key(|item| item.0);
        stations
    }
}

impl Display for Summary<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (position, (station, measurement)) in self.sorted().into_iter().enumerate() {
            if position > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={measurement}", station.as_bstr())?;
        }
        write!(f, "}}")
    }
}

pub fn format_summary(measurements: &Aggregations) -> String {
    Summary(measurements).to_string()
}

/// Writes the summary followed by a newline.
pub fn write_summary<W: Write>(writer: &mut W, measurements: &Aggregations) -> io::Result<()> {
    writeln!(writer, "{}", Summary(measurements))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregations(entries: &[(&str, StationStats)]) -> Aggregations {
        entries
            .iter()
            .map(|(station, stats)| (Box::from(station.as_bytes()), *stats))
            .collect()
    }

    #[test]
    fn empty_is_braces() {
        assert_eq!(format_summary(&Aggregations::default()), "{}");
    }

    #[test]
    fn sorts_stations_by_bytes() {
        let measurements = aggregations(&[
            ("b", StationStats::new(10)),
            ("Zurich", StationStats::new(20)),
            ("a", StationStats::new(-10)),
            ("Äbo", StationStats::new(0)),
        ]);
        assert_eq!(
            format_summary(&measurements),
            "{Zurich=2.0/2.0/2.0, a=-1.0/-1.0/-1.0, b=1.0/1.0/1.0, Äbo=0.0/0.0/0.0}"
        );
    }

    #[test]
    fn renders_min_mean_max() {
        let mut paris = StationStats::new(125);
        paris.update(-30);
        let measurements = aggregations(&[("Paris", paris), ("London", StationStats::new(82))]);
        assert_eq!(format_summary(&measurements), "{London=8.2/8.2/8.2, Paris=-3.0/4.8/12.5}");
    }

    #[test]
    fn write_summary_appends_newline() {
        let measurements = aggregations(&[("x", StationStats::new(5))]);
        let mut output = Vec::new();
        write_summary(&mut output, &measurements).unwrap();
        assert_eq!(output, b"{x=0.5/0.5/0.5}\n");
    }
}
