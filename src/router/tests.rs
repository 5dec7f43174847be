use super::*;
use crate::simulator::simulate;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn perm(v: &[usize]) -> Permutation {
    Permutation::new(v.to_vec()).unwrap()
}

fn check_routes(router: &Router, p: &Permutation) -> RoutingConfiguration {
    let config = router.route(p).unwrap();
    assert_eq!(config.len(), router.topology().switch_count(), "{}", p);
    assert_eq!(simulate(router.topology(), &config).unwrap(), p.as_slice(), "{}", p);
    config
}

/* Heap's algorithm */
fn for_each_permutation<F>(n: usize, mut f: F) where F: FnMut(&[usize]) {
    let mut a: Vec<usize> = (0 .. n).collect();
    let mut c = vec![0; n];
    f(&a);
    let mut i = 0;
    while i < n {
        if c[i] < i {
            if i % 2 == 0 {
                a.swap(0, i);
            } else {
                a.swap(c[i], i);
            }
            f(&a);
            c[i] += 1;
            i = 0;
        } else {
            c[i] = 0;
            i += 1;
        }
    }
}

#[test]
fn test_two_ports() {
    let router = Router::new(2).unwrap();
    let id = SwitchId { stage: 0, position: 0 };

    let straight = router.route(&perm(&[0, 1])).unwrap();
    assert_eq!(straight.len(), 1);
    assert_eq!(straight.get(id), Some(SwitchState::Straight));

    let cross = router.route(&perm(&[1, 0])).unwrap();
    assert_eq!(cross.get(id), Some(SwitchState::Cross));
}

#[test]
fn test_single_port() {
    let config = route(&perm(&[0])).unwrap();
    assert!(config.is_empty());
}

#[test]
fn test_identity_is_all_straight() {
    for n in 1 ..= 33 {
        let router = Router::new(n).unwrap();
        let config = check_routes(&router, &Permutation::identity(n));
        assert!(
            config.iter().all(|(_, state)| state == SwitchState::Straight),
            "n = {}", n
        );
    }
}

#[test]
fn test_eight_ports_sets_seventeen_switches() {
    let router = Router::new(8).unwrap();
    let p = perm(&[2, 4, 7, 5, 1, 3, 6, 0]);
    let config = check_routes(&router, &p);
    assert_eq!(router.topology().switch_count(), 17);
    assert_eq!(config.len(), 17);
    assert_eq!(config.settings().count(), 17);
}

#[test]
fn test_exhaustive_small_networks() {
    for n in 1 ..= 6 {
        let router = Router::new(n).unwrap();
        let mut count = 0;
        for_each_permutation(n, |p| {
            check_routes(&router, &perm(p));
            count += 1;
        });
        assert_eq!(count, (1 ..= n).product::<usize>());
    }
}

#[test]
fn test_random_permutations() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for n in (7 ..= 40).chain([64, 100, 128, 257]) {
        let router = Router::new(n).unwrap();
        for _ in 0 .. 10 {
            check_routes(&router, &Permutation::random(n, &mut rng));
        }
    }
}

#[test]
fn test_reversal() {
    for n in [3, 4, 9, 16] {
        let router = Router::new(n).unwrap();
        let p: Vec<usize> = (0 .. n).rev().collect();
        check_routes(&router, &perm(&p));
    }
}

#[test]
fn test_deterministic() {
    let mut rng = StdRng::seed_from_u64(3);
    for n in [5, 8, 21] {
        let router = Router::new(n).unwrap();
        let p = Permutation::random(n, &mut rng);
        let a = serde_json::to_string(&router.route(&p).unwrap()).unwrap();
        let b = serde_json::to_string(&router.route(&p).unwrap()).unwrap();
        let c = serde_json::to_string(&route(&p).unwrap()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
    }
}

#[test]
fn test_parallel_matches_sequential() {
    let mut rng = StdRng::seed_from_u64(17);
    for n in [5, 7, 8, 12, 16, 33] {
        let router = Router::new(n).unwrap();
        for _ in 0 .. 5 {
            let p = Permutation::random(n, &mut rng);
            let sequential = router.route(&p).unwrap();
            for threads in [1, 2, 3, 4, 8] {
                assert_eq!(router.route_parallel(&p, threads).unwrap(), sequential);
            }
        }
    }
}

#[test]
fn test_size_mismatch() {
    let router = Router::new(4).unwrap();
    assert!(matches!(
        router.route(&perm(&[1, 0, 2])),
        Err(Error::InvalidPermutation(_))
    ));
}

#[test]
fn test_unsupported_size() {
    assert!(matches!(Router::new(0), Err(Error::UnsupportedSize(0))));
}

#[test]
fn test_invalid_two_port_level() {
    let topology = Arc::new(Topology::build(2).unwrap());
    let root = Arc::clone(topology.root());
    assert!(matches!(
        route_block(&topology, &root, 0, 0, &[1, 1], 0),
        Err(Error::InvalidPermutation(_))
    ));
}

#[test]
fn test_unmatched_input_goes_to_lower_subnet() {
    /* Input 2 of a 3-port network has no switch and always enters the lower
     * sub-network, so 2 -> 0 needs the output switch crossed */
    let router = Router::new(3).unwrap();
    let config = check_routes(&router, &perm(&[1, 2, 0]));
    assert_eq!(config.get(SwitchId { stage: 2, position: 0 }), Some(SwitchState::Cross));
}

#[test]
fn test_conflict_graph_colors_alternate() {
    let p = [3, 0, 1, 2];
    let mut inv = [0; 4];
    for (i, &o) in p.iter().enumerate() {
        inv[o] = i;
    }
    let colors = ConflictGraph::new(&p, &inv).color().unwrap();

    /* Output 3 comes from input 0, which is anchored to the lower subnet */
    assert_eq!(colors, vec![Subnet::Lower, Subnet::Upper, Subnet::Lower, Subnet::Upper]);
}

#[test]
fn test_coloring_contradiction_is_reported() {
    /* Not a bijection: outputs 1 and 3 are requested twice, 4 and 5 never */
    let bad = [0, 2, 1, 1, 3, 3];
    let mut inv = [0; 6];
    for (i, &o) in bad.iter().enumerate() {
        inv[o] = i;
    }
    assert_eq!(ConflictGraph::new(&bad, &inv).color(), Err(0));

    let topology = Arc::new(Topology::build(6).unwrap());
    let root = Arc::clone(topology.root());
    match route_block(&topology, &root, 0, 0, &bad, 0) {
        Err(Error::InconsistentRouting { stage: 0, position: 0, permutation }) => {
            assert_eq!(permutation, bad.to_vec());
        },
        r => panic!("unexpected result {:?}", r),
    }
}
