//! End-to-end behavior of the public API without a running server.

use std::fs;

use additive_core::proto::simulation_request::Input;
use additive_core::{
    BuildFile, Error, Machine, MachineType, Material, PorosityInput,
    ServerLauncher, SimulationConfig, SimulationInput, SingleBeadInput, StlFile,
    ThermalHistoryInput,
};

#[test]
fn single_bead_marshaling() {
    let mut machine = Machine::default();
    machine.set_laser_power(99.0).unwrap();
    let input = SingleBeadInput::new("id", machine, Material::named("vibranium"))
        .with_bead_length(0.0012)
        .unwrap();

    let request = input.to_request();
    let Some(Input::SingleBeadInput(body)) = request.input else {
        panic!("wrong request branch");
    };
    assert_eq!(body.machine.unwrap().laser_power, 99.0);
    assert_eq!(body.material.unwrap().name, "vibranium");
    assert_eq!(body.bead_length, 0.0012);
}

#[test]
fn porosity_bounds() {
    let mut input = PorosityInput::default();
    let err = input.set_size_x(0.0009).unwrap_err();
    assert!(matches!(err, Error::InvalidValue(_)));
    input.set_size_x(0.001).unwrap();
    assert_eq!(input.size_x(), 0.001);
}

#[test]
fn thermal_history_without_geometry() {
    let err = ThermalHistoryInput::default()
        .to_request("remote.stl")
        .unwrap_err();
    assert!(err.to_string().contains("without defining geometry"));
}

#[test]
fn thermal_history_geometry_reassignment_is_checked() {
    let dir = tempfile::tempdir().unwrap();
    let stl_path = dir.path().join("part.stl");
    fs::write(&stl_path, b"solid part\nendsolid part\n").unwrap();

    let mut stl = StlFile::new(&stl_path).unwrap();
    assert!(stl.set_path(dir.path().join("missing.stl")).is_err());

    let input = ThermalHistoryInput::default().with_geometry(stl);
    let request = input.to_request("uploads/part.stl").unwrap();
    let Some(Input::ThermalHistoryInput(body)) = request.input else {
        panic!("wrong request branch");
    };
    assert!(body.geometry.is_some());

    let zip_path = dir.path().join("build.zip");
    fs::write(&zip_path, b"PK").unwrap();
    let build = BuildFile::new(MachineType::Trumpf, &zip_path).unwrap();
    assert_eq!(build.machine_type(), MachineType::Trumpf);
}

#[test]
fn unsupported_os_launch() {
    let launcher = ServerLauncher::new("unknown_os", "241", None);
    let err = launcher.launch(0, std::env::temp_dir()).unwrap_err();
    assert!(err.to_string().contains("Unsupported OS"));
}

#[cfg(feature = "rpc")]
#[test]
fn probe_of_unreachable_endpoint_is_false() {
    let port = additive_core::find_open_port().unwrap();
    let timeout = std::time::Duration::from_millis(500);
    assert!(!additive_core::probe_once("127.0.0.1", port, timeout));
}

#[test]
fn simulations_from_json_document() {
    let text = r#"[
        {"single_bead": {"id": "sb", "bead_length": 0.002, "machine": {"laser_power": 300}}},
        {"porosity": {"id": "po", "size_x": 0.005}},
        {"microstructure": {"id": "ms", "random_seed": 12}}
    ]"#;
    let configs: Vec<SimulationConfig> =
        additive_core::config::from_json("SimulationInput", text).unwrap();
    let inputs: Vec<SimulationInput> = configs
        .into_iter()
        .map(SimulationInput::try_from)
        .collect::<Result<_, _>>()
        .unwrap();

    let ids: Vec<&str> = inputs.iter().map(SimulationInput::id).collect();
    assert_eq!(ids, ["sb", "po", "ms"]);
    for input in &inputs {
        let request = input.to_request(None).unwrap();
        assert_eq!(request.id, input.id());
    }
    match &inputs[0] {
        SimulationInput::SingleBead(sb) => assert_eq!(sb.machine.laser_power(), 300.0),
        other => panic!("unexpected kind {:?}", other.kind()),
    }
}

#[test]
fn unknown_machine_field_names_the_machine() {
    let err = additive_core::config::from_json::<SimulationConfig>(
        "SimulationInput",
        r#"{"porosity": {"machine": {"laser_pwr": 100}}}"#,
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "'Machine' object has no attribute 'laser_pwr'");
}
