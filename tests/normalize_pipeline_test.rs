//! CPU-side load pipeline: parse, normalize, and the catalog's fixed poses.

use relic_gallery::normalize::{normalize, DEFAULT_SHININESS, DEFAULT_SPECULAR};
use relic_gallery::registry::{Registry, TextureSource};
use relic_gallery::resources::parse_artifact;

const OBJ_FOUR_PARTS: &str = "\
mtllib Model.mtl
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 0.0 1.0
vn 0.0 0.0 1.0
o part0
usemtl wall
f 1/1/1 2/2/1 3/3/1
o part1
usemtl roof
f 1/1/1 2/2/1 3/3/1
o part2
usemtl floor
f 1/1/1 2/2/1 3/3/1
o part3
usemtl stairs
f 1/1/1 2/2/1 3/3/1
";

const MTL_FOUR_PARTS: &str = "\
newmtl wall
Ns 10.0
newmtl roof
Ks 0.9 0.9 0.9
newmtl floor
newmtl stairs
Ns 64.0
Ks 0.1 0.2 0.3
";

#[test]
fn a_texture_list_is_paired_index_for_index() {
    let raw = futures::executor::block_on(parse_artifact(
        OBJ_FOUR_PARTS,
        MTL_FOUR_PARTS,
        "Model.obj",
    ))
    .unwrap();
    assert_eq!(raw.materials.len(), 4);

    let textures = TextureSource::many(["Model_0.jpg", "Model_1.jpg"]);
    let entry = Registry::museum().get("shanxi").unwrap().clone();
    let normalized = normalize(&raw, &textures, entry.transform).unwrap();

    assert_eq!(normalized.materials.len(), 4);
    assert_eq!(normalized.materials[0].texture, Some(0));
    assert_eq!(normalized.materials[1].texture, Some(1));
    assert_eq!(normalized.materials[2].texture, None);
    assert_eq!(normalized.materials[3].texture, None);

    // MTL-provided shading survives; anything missing falls to the defaults.
    assert_eq!(normalized.materials[0].shininess, 10.0);
    assert_eq!(normalized.materials[0].specular, DEFAULT_SPECULAR);
    assert_eq!(normalized.materials[1].shininess, DEFAULT_SHININESS);
    assert_eq!(normalized.materials[1].specular, [0.9, 0.9, 0.9]);
    assert_eq!(normalized.materials[2].shininess, DEFAULT_SHININESS);
    assert_eq!(normalized.materials[3].shininess, 64.0);
    assert_eq!(normalized.materials[3].specular, [0.1, 0.2, 0.3]);
}

#[test]
fn a_single_texture_covers_every_sub_material() {
    let raw = futures::executor::block_on(parse_artifact(
        OBJ_FOUR_PARTS,
        MTL_FOUR_PARTS,
        "Model.obj",
    ))
    .unwrap();

    let entry = Registry::museum().get("qingtong").unwrap().clone();
    let normalized = normalize(&raw, &entry.textures, entry.transform).unwrap();

    assert_eq!(normalized.materials.len(), 4);
    assert!(normalized.materials.iter().all(|m| m.texture == Some(0)));
}

#[test]
fn catalog_poses_ride_along_into_the_normalized_artifact() {
    let registry = Registry::museum();
    let raw = futures::executor::block_on(parse_artifact(
        OBJ_FOUR_PARTS,
        MTL_FOUR_PARTS,
        "Model.obj",
    ))
    .unwrap();

    for entry in registry.entries() {
        let textures = TextureSource::single("tex0.png");
        let normalized = normalize(&raw, &textures, entry.transform).unwrap();
        assert_eq!(normalized.transform, entry.transform);
    }

    let qingtong = registry.get("qingtong").unwrap();
    assert_eq!(qingtong.transform.scale, [1.5; 3]);
    assert_eq!(qingtong.transform.position, [0.0, -0.6, 0.0]);
    assert_eq!(qingtong.transform.rotation, [0.0; 3]);
}
