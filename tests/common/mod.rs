//! Shared fixtures for composition tests.

use urdf_compose::UrdfDocument;

/// A straight segment: one input link, one output link, one joint between them.
pub const ROD: &str = r#"<robot name="rod">
  <material name="rod_gray">
    <color rgba="0.6 0.6 0.6 1" />
  </material>
  <link name="INPUT-plug">
    <visual>
      <geometry>
        <cylinder radius="0.02" length="0.4" />
      </geometry>
      <material name="rod_gray" />
    </visual>
  </link>
  <link name="OUTPUT-socket" />
  <joint name="joint" type="fixed">
    <origin xyz="0 0 0.4" rpy="0 0 0" />
    <parent link="INPUT-plug" />
    <child link="OUTPUT-socket" />
  </joint>
</robot>"#;

/// A forked segment with an extra lowercase `output-sideways` link that only
/// an explicit connection can select.
pub const V_ROD: &str = r#"<robot name="v_rod">
  <material name="rod_gray">
    <color rgba="0.6 0.6 0.6 1" />
  </material>
  <link name="INPUT-plug">
    <visual>
      <geometry>
        <cylinder radius="0.02" length="0.4" />
      </geometry>
      <material name="rod_gray" />
    </visual>
  </link>
  <link name="OUTPUT-socket" />
  <link name="output-sideways" />
  <joint name="joint" type="fixed">
    <origin xyz="0 0 0.4" rpy="0 0 0" />
    <parent link="INPUT-plug" />
    <child link="OUTPUT-socket" />
  </joint>
  <joint name="side_joint" type="fixed">
    <origin xyz="0.1 0 0.2" rpy="0 -1.5708 0" />
    <parent link="INPUT-plug" />
    <child link="output-sideways" />
  </joint>
</robot>"#;

pub fn rod(label: &str) -> UrdfDocument {
    UrdfDocument::parse(label, ROD).expect("rod fixture parses")
}

pub fn v_rod(label: &str) -> UrdfDocument {
    UrdfDocument::parse(label, V_ROD).expect("v_rod fixture parses")
}
