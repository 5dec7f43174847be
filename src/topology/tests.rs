use super::*;

/// Sum of ceil(log2 i) for i in 1..=n, the switch count of an arbitrary-size
/// Waksman network.
fn waksman_bound(n: usize) -> usize {
    (1 ..= n)
        .map(|i| (usize::BITS - (i - 1).leading_zeros()) as usize)
        .sum()
}

#[test]
fn test_eight_ports_has_seventeen_switches() {
    let topology = Topology::build(8).unwrap();
    assert_eq!(topology.switch_count(), 17);
    assert_eq!(topology.switches().count(), 17);
    assert_eq!(topology.stage_count(), 5);
}

#[test]
fn test_power_of_two_counts() {
    for log in 1 .. 8 {
        let n = 1usize << log;
        let topology = Topology::build(n).unwrap();
        assert_eq!(topology.switch_count(), n * log - n + 1, "n = {}", n);
        assert_eq!(topology.stage_count(), 2 * log - 1, "n = {}", n);
    }
}

#[test]
fn test_arbitrary_size_counts() {
    for n in 1 ..= 70 {
        let topology = Topology::build(n).unwrap();
        assert_eq!(topology.switch_count(), waksman_bound(n), "n = {}", n);
        assert_eq!(topology.switches().count(), topology.switch_count(), "n = {}", n);
    }
}

#[test]
fn test_small_sizes() {
    let one = Topology::build(1).unwrap();
    assert_eq!((one.switch_count(), one.stage_count()), (0, 0));

    let two = Topology::build(2).unwrap();
    assert_eq!((two.switch_count(), two.stage_count()), (1, 1));

    let three = Topology::build(3).unwrap();
    assert_eq!((three.switch_count(), three.stage_count()), (3, 3));
    /* Middle stage holds only the lower (size 2) sub-network */
    assert_eq!(three.line_of(SwitchId { stage: 1, position: 0 }), Some(1));
}

#[test]
fn test_zero_is_unsupported() {
    assert!(matches!(Topology::build(0), Err(Error::UnsupportedSize(0))));
    assert!(matches!(TopologyBuilder::new().build(0), Err(Error::UnsupportedSize(0))));
}

#[test]
fn test_blocks_are_shared_by_size() {
    let mut builder = TopologyBuilder::new();
    let root = builder.build(16).unwrap();
    let upper = root.upper.as_ref().unwrap();
    let lower = root.lower.as_ref().unwrap();
    assert!(Arc::ptr_eq(upper, lower));
    assert!(Arc::ptr_eq(&builder.build(8).unwrap(), upper));
}

#[test]
fn test_switches_do_not_overlap() {
    for n in 1 ..= 40 {
        let topology = Topology::build(n).unwrap();
        for stage in 0 .. topology.stage_count() {
            let mut used = vec![false; n];
            for position in 0 .. topology.switches_in_stage(stage) {
                let line = topology.line_of(SwitchId { stage, position }).unwrap();
                assert!(line + 1 < n);
                assert!(!used[line] && !used[line + 1], "n = {}, stage {}", n, stage);
                used[line] = true;
                used[line + 1] = true;

                assert_eq!(topology.position_of(stage, line), Some(position));
                assert_eq!(
                    topology.switch_on_line(stage, line + 1),
                    Some((SwitchId { stage, position }, 1))
                );
            }
        }
    }
}

#[test]
fn test_links_are_permutations() {
    for n in 1 ..= 40 {
        let topology = Topology::build(n).unwrap();
        for gap in 0 .. topology.stage_count().saturating_sub(1) {
            let mut seen = vec![false; n];
            for line in 0 .. n {
                let to = topology.link(gap, line);
                assert!(!seen[to], "n = {}, gap {}", n, gap);
                seen[to] = true;
            }
        }
    }
}

#[test]
fn test_first_link_of_eight_ports() {
    /* Upper outputs of the input switches go to the upper half */
    let topology = Topology::build(8).unwrap();
    let links: Vec<usize> = (0 .. 8).map(|l| topology.link(0, l)).collect();
    assert_eq!(links, vec![0, 4, 1, 5, 2, 6, 3, 7]);
    let links: Vec<usize> = (0 .. 8).map(|l| topology.link(3, l)).collect();
    assert_eq!(links, vec![0, 2, 4, 6, 1, 3, 5, 7]);
}
