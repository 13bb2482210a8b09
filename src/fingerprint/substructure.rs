/// Functional groups of the substructure fingerprint, one bit each, in bit order.
pub const FUNCTIONAL_GROUPS: [(&str, &str); 100] = [
    ("Primary carbon", "[CX4H3][#6]"),
    ("Secondary carbon", "[CX4H2]([#6])[#6]"),
    ("Tertiary carbon", "[CX4H1]([#6])([#6])[#6]"),
    ("Quaternary carbon", "[CX4H0]([#6])([#6])([#6])[#6]"),
    ("Alkene", "[CX3]=[CX3]"),
    ("Alkyne", "[CX2]#[CX2]"),
    ("Allene", "[CX3]=[CX2]=[CX3]"),
    ("Alkyl halide", "[CX4][F,Cl,Br,I]"),
    ("Alkyl fluoride", "[CX4]F"),
    ("Alkyl chloride", "[CX4]Cl"),
    ("Alkyl bromide", "[CX4]Br"),
    ("Alkyl iodide", "[CX4]I"),
    ("Aryl halide", "c[F,Cl,Br,I]"),
    ("Vinyl halide", "[CX3]=[CX3][F,Cl,Br,I]"),
    ("Acyl halide", "[CX3](=O)[F,Cl,Br,I]"),
    ("Alcohol", "[#6][OX2H]"),
    ("Primary alcohol", "[CX4H2,CX4H3][OX2H]"),
    ("Secondary alcohol", "[CX4H1]([#6])([#6])[OX2H]"),
    ("Tertiary alcohol", "[CX4H0]([#6])([#6])([#6])[OX2H]"),
    ("1,2-Diol", "[OX2H][CX4][CX4][OX2H]"),
    ("Enol", "[OX2H][CX3]=[CX3]"),
    ("Phenol", "c[OX2H]"),
    ("Ether", "[OD2]([#6])[#6]"),
    ("Dialkyl ether", "[OX2]([CX4])[CX4]"),
    ("Alkyl aryl ether", "[OX2](c)[CX4]"),
    ("Diaryl ether", "c[OX2]c"),
    ("Epoxide", "[CX4]1[OX2][CX4]1"),
    ("Peroxide", "[OX2][OX2]"),
    ("Aldehyde", "[CX3H1](=O)[#6]"),
    ("Ketone", "[#6][CX3](=O)[#6]"),
    ("Carboxylic acid", "[CX3](=O)[OX2H1]"),
    ("Carboxylate anion", "[CX3](=O)[OX1-]"),
    ("Ester", "[#6][CX3](=O)[OX2H0][#6]"),
    ("Lactone", "[#6][CX3R](=O)[OX2R][#6]"),
    ("Anhydride", "[CX3](=O)[OX2][CX3](=O)"),
    ("Carbonate", "[OX2][CX3](=O)[OX2]"),
    ("Carbamate", "[NX3][CX3](=O)[OX2]"),
    ("Urea", "[NX3][CX3](=O)[NX3]"),
    ("Amide", "[NX3][CX3](=O)[#6]"),
    ("Primary amide", "[NX3H2][CX3](=O)[#6]"),
    ("Secondary amide", "[NX3H1]([#6])[CX3](=O)[#6]"),
    ("Tertiary amide", "[NX3H0]([#6])([#6])[CX3](=O)[#6]"),
    ("Lactam", "[#6][CX3R](=O)[NX3R]"),
    ("Imide", "[CX3](=O)[NX3][CX3](=O)"),
    ("Primary amine", "[NX3H2][CX4]"),
    ("Secondary amine", "[NX3H1]([CX4])[CX4]"),
    ("Tertiary amine", "[NX3H0]([CX4])([CX4])[CX4]"),
    ("Quaternary ammonium", "[NX4+]"),
    ("Aniline", "c[NX3H2]"),
    ("Enamine", "[NX3][CX3]=[CX3]"),
    ("Imine", "[CX3]=[NX2]"),
    ("Oxime", "[CX3]=[NX2][OX2H]"),
    ("Hydrazine", "[NX3][NX3]"),
    ("Hydrazone", "[NX3][NX2]=[#6]"),
    ("Azo", "[#6][NX2]=[NX2][#6]"),
    ("Azide", "[NX2]=[NX2+]=[NX1-]"),
    ("Diazo", "[#6]=[NX2+]=[NX1-]"),
    ("Nitrile", "[NX1]#[CX2]"),
    ("Isonitrile", "[CX1-]#[NX2+]"),
    ("Cyanate", "[OX2][CX2]#[NX1]"),
    ("Isocyanate", "[NX2]=[CX2]=[OX1]"),
    ("Isothiocyanate", "[NX2]=[CX2]=[SX1]"),
    ("Nitro", "[NX3+](=O)[O-]"),
    ("Nitroso", "[#6][NX2]=[OX1]"),
    ("N-oxide", "[#7+][OX1-]"),
    ("Hydroxylamine", "[NX3][OX2H]"),
    ("Thiol", "[#6][SX2H]"),
    ("Thioether", "[#6][SX2][#6]"),
    ("Disulfide", "[SX2][SX2]"),
    ("Thioketone", "[#6][CX3](=S)[#6]"),
    ("Thioamide", "[NX3][CX3]=[SX1]"),
    ("Thiourea", "[NX3][CX3](=[SX1])[NX3]"),
    ("Sulfoxide", "[#6][SX3](=O)[#6]"),
    ("Sulfone", "[#6][SX4](=O)(=O)[#6]"),
    ("Sulfonic acid", "[SX4](=O)(=O)[OX2H]"),
    ("Sulfonamide", "[SX4](=O)(=O)[NX3]"),
    ("Sulfonate ester", "[SX4](=O)(=O)[OX2][#6]"),
    ("Sulfate", "[OX2][SX4](=O)(=O)[OX2]"),
    ("Phosphine", "[PX3]([#6])([#6])[#6]"),
    ("Phosphate", "[PX4](=O)([OX2])([OX2])[OX2]"),
    ("Phosphonate", "[PX4](=O)([OX2])([OX2])[#6]"),
    ("Boronic acid", "[BX3]([OX2H])[OX2H]"),
    ("Silane", "[Si]"),
    ("Benzene ring", "c1ccccc1"),
    ("Pyridine", "n1ccccc1"),
    ("Pyrrole", "[nH]1cccc1"),
    ("Furan", "o1cccc1"),
    ("Thiophene", "s1cccc1"),
    ("Imidazole", "[nX3]1c[nX2]cc1"),
    ("Pyrimidine", "n1cnccc1"),
    ("Indole", "c1ccc2[nX3]ccc2c1"),
    ("Naphthalene", "c1ccc2ccccc2c1"),
    ("Aromatic nitrogen", "[n]"),
    ("Aromatic oxygen", "[o]"),
    ("Aromatic sulfur", "[s]"),
    ("Heterocycle", "[!#6;R]"),
    ("Cyclopropane", "[CX4]1[CX4][CX4]1"),
    ("Cyclohexane", "[CX4]1[CX4][CX4][CX4][CX4][CX4]1"),
    ("Trifluoromethyl", "[CX4](F)(F)F"),
    ("Michael acceptor", "[CX3]=[CX3][CX3]=O"),
];

/// Bit index of a functional group, looked up by name.
pub fn functional_group_index(name: &str) -> Option<usize> {
    FUNCTIONAL_GROUPS.iter().position(|&(group, _)| group == name)
}
