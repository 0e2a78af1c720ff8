use std::path::PathBuf;

use ios_config_core::{parse, parse_file, ParseError};

fn fixture(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join(path)
}

#[test]
fn parses_running_config_blocks() {
    let root = parse_file(&fixture("fixtures/configs/r1-running.txt")).expect("parse");

    let hostname = root.get_child(&["hostname"]).expect("hostname");
    assert_eq!(hostname.words, vec!["hostname", "R1"]);
    assert_eq!(hostname.line, 9);

    let interfaces = root.get_children(&["interface"]);
    assert_eq!(interfaces.len(), 3);
    let gi0 = interfaces[0];
    assert_eq!(gi0.words[1], "GigabitEthernet0/0");
    assert!(gi0.get_child(&["ip", "address"]).is_some());
    assert!(gi0.get_child(&["no", "shutdown"]).is_some());

    assert_eq!(root.get_children(&["ip", "route"]).len(), 3);
    let vty = root.get_child(&["line", "vty"]).expect("vty line");
    assert_eq!(vty.children.len(), 2);
}

#[test]
fn global_commands_close_an_open_interface_without_exit() {
    let root = parse(
        "int g0/0\n ip add 10.0.0.1 255.255.255.0\nip route 0.0.0.0 0.0.0.0 10.0.0.2\nhostname R9\n",
    )
    .expect("parse");

    let iface = root.get_child(&["interface"]).expect("interface");
    assert_eq!(iface.children.len(), 1);
    assert!(root.get_child(&["ip", "route"]).is_some());
    assert!(root.get_child(&["hostname"]).is_some());
}

#[test]
fn a_new_mode_opener_closes_the_previous_mode() {
    let root = parse("router ospf 1\n net 10.0.0.0 0.0.0.255 area 0\ninterface Lo0\n ip addr 1.1.1.1 255.255.255.255\n")
        .expect("parse");
    let router = root.get_child(&["router", "ospf"]).expect("router");
    assert_eq!(router.children.len(), 1);
    assert_eq!(router.children[0].words[0], "network");
    let lo = root.get_child(&["interface"]).expect("loopback");
    assert_eq!(lo.children.len(), 1);
}

#[test]
fn nested_address_family_stays_under_router() {
    let root = parse_file(&fixture("fixtures/configs/r1-ospf.txt")).expect("parse");
    let router = root.get_child(&["router", "ospf"]).expect("router");
    let af = router
        .get_child(&["address-family"])
        .expect("address family block");
    assert_eq!(af.children.len(), 1);
    assert!(router.get_child(&["default-information"]).is_some());
}

#[test]
fn named_access_list_collects_entries() {
    let root = parse_file(&fixture("fixtures/configs/r1-ospf.txt")).expect("parse");
    let acl = root
        .get_child(&["ip", "access-list", "extended"])
        .expect("named acl");
    assert_eq!(acl.children.len(), 2);
    assert_eq!(root.get_children(&["access-list"]).len(), 2);
}

#[test]
fn exit_and_end_pop_context() {
    let root = parse("interface Lo1\n exit\n description stray\nend\n").expect("parse");
    let iface = root.get_child(&["interface"]).expect("interface");
    assert!(iface.children.is_empty());
    assert!(root.get_child(&["description"]).is_some());
}

#[test]
fn empty_input_is_an_error() {
    assert!(matches!(parse(""), Err(ParseError::Empty)));
    assert!(matches!(parse("!\n!\n"), Err(ParseError::Empty)));
}
