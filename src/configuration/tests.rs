use super::*;

fn id(stage: usize, position: usize) -> SwitchId {
    SwitchId { stage, position }
}

#[test]
fn test_assembler_rejects_duplicates() {
    let perm = [1, 0, 2];
    let mut assembler = ConfigurationAssembler::new(&perm);
    assembler.assign(id(0, 0), SwitchState::Cross).unwrap();

    match assembler.assign(id(0, 0), SwitchState::Cross) {
        Err(Error::DuplicateAssignment { stage: 0, position: 0, permutation }) => {
            assert_eq!(permutation, vec![1, 0, 2]);
        },
        r => panic!("unexpected result {:?}", r),
    }
}

#[test]
fn test_merge_orders_by_stage_and_position() {
    let mut a = ConfigurationAssembler::new(&[]);
    a.assign(id(2, 0), SwitchState::Cross).unwrap();
    a.assign(id(0, 1), SwitchState::Straight).unwrap();
    let mut b = ConfigurationAssembler::new(&[]);
    b.assign(id(1, 0), SwitchState::Straight).unwrap();
    b.assign(id(0, 0), SwitchState::Cross).unwrap();

    let merged = merge([a.finish(), b.finish()], &[]).unwrap();
    let ids: Vec<SwitchId> = merged.iter().map(|(id, _)| id).collect();
    assert_eq!(ids, vec![id(0, 0), id(0, 1), id(1, 0), id(2, 0)]);
    assert_eq!(merged.get(id(2, 0)), Some(SwitchState::Cross));
    assert_eq!(merged.get(id(3, 0)), None);
}

#[test]
fn test_merge_detects_overlapping_levels() {
    let mut a = ConfigurationAssembler::new(&[]);
    a.assign(id(1, 1), SwitchState::Cross).unwrap();
    let mut b = ConfigurationAssembler::new(&[]);
    b.assign(id(1, 1), SwitchState::Straight).unwrap();

    let perm = [0, 1];
    assert!(matches!(
        merge([a.finish(), b.finish()], &perm),
        Err(Error::DuplicateAssignment { stage: 1, position: 1, .. })
    ));
}

#[test]
fn test_completeness_against_topology() {
    let topology = Topology::build(3).unwrap();
    let mut assembler = ConfigurationAssembler::new(&[]);
    for (id, _) in topology.switches() {
        assembler.assign(id, SwitchState::Straight).unwrap();
    }
    let config = assembler.finish();
    assert!(config.is_complete_for(&topology));

    let mut partial = ConfigurationAssembler::new(&[]);
    partial.assign(id(0, 0), SwitchState::Straight).unwrap();
    assert!(matches!(
        partial.finish().check_complete_for(&topology),
        Err(Error::IncompleteConfiguration { stage: 1, position: 0 })
    ));

    let mut extra = ConfigurationAssembler::new(&[]);
    extra.absorb(config).unwrap();
    extra.assign(id(7, 7), SwitchState::Cross).unwrap();
    assert!(matches!(
        extra.finish().check_complete_for(&topology),
        Err(Error::IncompleteConfiguration { stage: 7, position: 7 })
    ));
}

#[test]
fn test_serialized_as_triples() {
    let mut assembler = ConfigurationAssembler::new(&[]);
    assembler.assign(id(0, 0), SwitchState::Straight).unwrap();
    assembler.assign(id(1, 2), SwitchState::Cross).unwrap();
    let config = assembler.finish();

    let json = serde_json::to_string(&config).unwrap();
    assert_eq!(
        json,
        r#"[{"stage":0,"position":0,"state":"straight"},{"stage":1,"position":2,"state":"cross"}]"#
    );

    let back: RoutingConfiguration = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);

    let dup = r#"[{"stage":0,"position":0,"state":"cross"},{"stage":0,"position":0,"state":"cross"}]"#;
    assert!(serde_json::from_str::<RoutingConfiguration>(dup).is_err());
}

#[test]
fn test_output_port() {
    assert_eq!(SwitchState::Straight.output_port(0), 0);
    assert_eq!(SwitchState::Straight.output_port(1), 1);
    assert_eq!(SwitchState::Cross.output_port(0), 1);
    assert_eq!(SwitchState::Cross.output_port(1), 0);
}
