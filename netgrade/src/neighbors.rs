use std::collections::BTreeSet;
use std::net::Ipv4Addr;

use crate::identity::AddressRewriter;

/// Neighbour addresses from `show ip ospf neighbor` output.
///
/// The address column is the fifth field of a data row, but point-to-point
/// rows print the state as `FULL/  -`, which shifts the columns; the first
/// address after the neighbour id is taken instead. The header row and blank
/// lines are skipped.
pub fn parse_ospf_neighbors(output: &str, rewriter: &AddressRewriter) -> BTreeSet<Ipv4Addr> {
    let mut out = BTreeSet::new();
    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() || line.to_ascii_lowercase().starts_with("neighbor id") {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 5 || rewriter.address(fields[0]).is_none() {
            continue;
        }
        if let Some(addr) = fields[1..].iter().find_map(|f| rewriter.address(f)) {
            out.insert(addr);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::net::Ipv4Addr;

    use super::parse_ospf_neighbors;
    use crate::identity::{AddressRewriter, IdentityHint};

    const OUTPUT: &str = "\
Neighbor ID     Pri   State           Dead Time   Address         Interface
2.2.2.2           1   FULL/DR         00:00:35    10.0.12.2       GigabitEthernet0/1
3.3.3.3           0   FULL/  -        00:00:31    10.0.13.3       Serial0/0/0

R1#
";

    #[test]
    fn reads_address_column() {
        let found = parse_ospf_neighbors(OUTPUT, &AddressRewriter::identity());
        let expected: BTreeSet<Ipv4Addr> = [Ipv4Addr::new(10, 0, 12, 2), Ipv4Addr::new(10, 0, 13, 3)]
            .into_iter()
            .collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn personal_addresses_are_rewritten() {
        let hint = IdentityHint::parse("212.05").expect("hint");
        let rewriter = AddressRewriter::new(&hint, None).expect("rewriter");
        let found = parse_ospf_neighbors(
            "2.2.2.2  1  FULL/DR  00:00:35  201.17.12.2  Gi0/1\n",
            &rewriter,
        );
        assert!(found.contains(&Ipv4Addr::new(212, 5, 12, 2)));
    }
}
