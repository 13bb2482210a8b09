//! The public MACCS 166 structural keys.
//!
//! Key `n` occupies bit `n - 1`. Keys whose public definition is a recursive
//! SMARTS use their first alternative.

use super::keys::KeyDefinition::{self, AromaticRings, Fragments, Isotope, LargeRing, Smarts, Unused};

pub(crate) const MACCS_KEYS: [KeyDefinition; 166] = [
    Isotope,
    Smarts("[#104]", 0),
    Smarts("[#32,#33,#34,#50,#51,#52,#82,#83,#84]", 0),
    Smarts("[Ac,Th,Pa,U,Np,Pu,Am,Cm,Bk,Cf,Es,Fm,Md,No,Lr]", 0),
    Smarts("[Sc,Ti,Y,Zr,Hf]", 0),
    Smarts("[La,Ce,Pr,Nd,Pm,Sm,Eu,Gd,Tb,Dy,Ho,Er,Tm,Yb,Lu]", 0),
    Smarts("[V,Cr,Mn,Nb,Mo,Tc,Ta,W,Re]", 0),
    Smarts("[!#6;!#1]1~*~*~*~1", 0),
    Smarts("[Fe,Co,Ni,Ru,Rh,Pd,Os,Ir,Pt]", 0),
    Smarts("[Be,Mg,Ca,Sr,Ba,Ra]", 0),
    // 11
    Smarts("*1~*~*~*~1", 0),
    Smarts("[Cu,Zn,Ag,Cd,Au,Hg]", 0),
    Smarts("[#8]~[#7](~[#6])~[#6]", 0),
    Smarts("[#16]-[#16]", 0),
    Smarts("[#8]~[#6](~[#8])~[#8]", 0),
    Smarts("[!#6;!#1]1~*~*~1", 0),
    Smarts("[#6]#[#6]", 0),
    Smarts("[#5,#13,#31,#49,#81]", 0),
    Smarts("*1~*~*~*~*~*~*~1", 0),
    Smarts("[#14]", 0),
    // 21
    Smarts("[#6]=[#6](~[!#6;!#1])~[!#6;!#1]", 0),
    Smarts("*1~*~*~1", 0),
    Smarts("[#7]~[#6](~[#8])~[#8]", 0),
    Smarts("[#7]-[#8]", 0),
    Smarts("[#7]~[#6](~[#7])~[#7]", 0),
    Smarts("[#6]=;@[#6](@*)@*", 0),
    Smarts("[I]", 0),
    Smarts("[!#6;!#1]~[CH2]~[!#6;!#1]", 0),
    Smarts("[#15]", 0),
    Smarts("[#6]~[!#6;!#1](~[#6])(~[#6])~*", 0),
    // 31
    Smarts("[!#6;!#1]~[F,Cl,Br,I]", 0),
    Smarts("[#6]~[#16]~[#7]", 0),
    Smarts("[#7]~[#16]", 0),
    Smarts("[CH2]=*", 0),
    Smarts("[Li,Na,K,Rb,Cs,Fr]", 0),
    Smarts("[#16R]", 0),
    Smarts("[#7]~[#6](~[#8])~[#7]", 0),
    Smarts("[#7]~[#6](~[#6])~[#7]", 0),
    Smarts("[#8]~[#16](~[#8])~[#8]", 0),
    Smarts("[#16]-[#8]", 0),
    // 41
    Smarts("[#6]#[#7]", 0),
    Smarts("F", 0),
    Smarts("[!#6;!#1;!H0]~*~[!#6;!#1;!H0]", 0),
    Unused,
    Smarts("[#6]=[#6]~[#7]", 0),
    Smarts("Br", 0),
    Smarts("[#16]~*~[#7]", 0),
    Smarts("[#8]~[!#6;!#1](~[#8])(~[#8])", 0),
    Smarts("[!+0]", 0),
    Smarts("[#6]=[#6](~[#6])~[#6]", 0),
    // 51
    Smarts("[#6]~[#16]~[#8]", 0),
    Smarts("[#7]~[#7]", 0),
    Smarts("[!#6;!#1;!H0]~*~*~*~[!#6;!#1;!H0]", 0),
    Smarts("[!#6;!#1;!H0]~*~*~[!#6;!#1;!H0]", 0),
    Smarts("[#8]~[#16]~[#8]", 0),
    Smarts("[#8]~[#7](~[#8])~[#6]", 0),
    Smarts("[O;R]", 0),
    Smarts("[!#6;!#1]~[#16]~[!#6;!#1]", 0),
    Smarts("[#16]!:*:*", 0),
    Smarts("[#16]=[#8]", 0),
    // 61
    Smarts("*~[#16](~*)~*", 0),
    Smarts("*@*!@*@*", 0),
    Smarts("[#7]=[#8]", 0),
    Smarts("*@*!@[#16]", 0),
    Smarts("c:n", 0),
    Smarts("[#6]~[#6](~[#6])(~[#6])~*", 0),
    Smarts("[!#6;!#1]~[#16]", 0),
    Smarts("[!#6;!#1;!H0]~[!#6;!#1;!H0]", 0),
    Smarts("[!#6;!#1]~[!#6;!#1;!H0]", 0),
    Smarts("[!#6;!#1]~[#7]~[!#6;!#1]", 0),
    // 71
    Smarts("[#7]~[#8]", 0),
    Smarts("[#8]~*~*~[#8]", 0),
    Smarts("[#16]=*", 0),
    Smarts("[CH3]~*~[CH3]", 0),
    Smarts("*!@[#7]@*", 0),
    Smarts("[#6]=[#6](~*)~*", 0),
    Smarts("[#7]~*~[#7]", 0),
    Smarts("[#6]=[#7]", 0),
    Smarts("[#7]~*~*~[#7]", 0),
    Smarts("[#7]~*~*~*~[#7]", 0),
    // 81
    Smarts("[#16]~*(~*)~*", 0),
    Smarts("*~[CH2]~[!#6;!#1;!H0]", 0),
    Smarts("[!#6;!#1]1~*~*~*~*~1", 0),
    Smarts("[NH2]", 0),
    Smarts("[#6]~[#7](~[#6])~[#6]", 0),
    Smarts("[C;H2,H3][!#6;!#1][C;H2,H3]", 0),
    Smarts("[F,Cl,Br,I]!@*@*", 0),
    Smarts("[#16]", 0),
    Smarts("[#8]~*~*~*~[#8]", 0),
    Smarts("[!#6;!#1;!H0]~*~*~[CH2]~*", 0),
    // 91
    Smarts("[!#6;!#1;!H0]~*~*~*~[CH2]~*", 0),
    Smarts("[#8]~[#6](~[#7])~[#6]", 0),
    Smarts("[!#6;!#1]~[CH3]", 0),
    Smarts("[!#6;!#1]~[#7]", 0),
    Smarts("[#7]~*~*~[#8]", 0),
    Smarts("*1~*~*~*~*~1", 0),
    Smarts("[#7]~*~*~*~[#8]", 0),
    Smarts("[!#6;!#1]1~*~*~*~*~*~1", 0),
    Smarts("[#6]=[#6]", 0),
    Smarts("*~[CH2]~[#7]", 0),
    // 101
    LargeRing,
    Smarts("[!#6;!#1]~[#8]", 0),
    Smarts("Cl", 0),
    Smarts("[!#6;!#1;!H0]~*~[CH2]~*", 0),
    Smarts("*@*(@*)@*", 0),
    Smarts("[!#6;!#1]~*(~[!#6;!#1])~[!#6;!#1]", 0),
    Smarts("[F,Cl,Br,I]~*(~*)~*", 0),
    Smarts("[CH3]~*~*~*~[CH2]~*", 0),
    Smarts("*~[CH2]~[#8]", 0),
    Smarts("[#7]~[#6]~[#8]", 0),
    // 111
    Smarts("[#7]~*~[CH2]~*", 0),
    Smarts("*~*(~*)(~*)~*", 0),
    Smarts("[#8]!:*:*", 0),
    Smarts("[CH3]~[CH2]~*", 0),
    Smarts("[CH3]~*~[CH2]~*", 0),
    Smarts("[CH3]~*~*~[CH2]~*", 0),
    Smarts("[#7]~*~[#8]", 0),
    Smarts("*~[CH2]~[CH2]~*", 1),
    Smarts("[#7]=*", 0),
    Smarts("[!#6;R]", 1),
    // 121
    Smarts("[#7;R]", 0),
    Smarts("*~[#7](~*)~*", 0),
    Smarts("[#8]~[#6]~[#8]", 0),
    Smarts("[!#6;!#1]~[!#6;!#1]", 0),
    AromaticRings,
    Smarts("*!@[#8]!@*", 0),
    Smarts("*@*!@[#8]", 1),
    Smarts("*~[CH2]~*~*~*~[CH2]~*", 0),
    Smarts("*~[CH2]~*~*~[CH2]~*", 0),
    Smarts("[!#6;!#1]~[!#6;!#1]", 1),
    // 131
    Smarts("[!#6;!#1;!H0]", 1),
    Smarts("[#8]~*~[CH2]~*", 0),
    Smarts("*@*!@[#7]", 0),
    Smarts("[F,Cl,Br,I]", 0),
    Smarts("[#7]!:*:*", 0),
    Smarts("[#8]=*", 1),
    Smarts("[!C;!c;R]", 0),
    Smarts("[!#6;!#1]~[CH2]~*", 1),
    Smarts("[O;!H0]", 0),
    Smarts("[#8]", 3),
    // 141
    Smarts("[CH3]", 2),
    Smarts("[#7]", 1),
    Smarts("*@*!@[#8]", 0),
    Smarts("*!:*:*!:*", 0),
    Smarts("*1~*~*~*~*~*~1", 1),
    Smarts("[#8]", 2),
    Smarts("*~[CH2]~[CH2]~*", 0),
    Smarts("*~[!#6;!#1](~*)~*", 0),
    Smarts("[C;H3,H4]", 1),
    Smarts("*!@*@*!@*", 0),
    // 151
    Smarts("[#7;!H0]", 0),
    Smarts("[#8]~[#6](~[#6])~[#6]", 0),
    Smarts("[!#6;!#1]~[CH2]~*", 0),
    Smarts("[#6]=[#8]", 0),
    Smarts("*!@[CH2]!@*", 0),
    Smarts("[#7]~*(~*)~*", 0),
    Smarts("[#6]-[#8]", 0),
    Smarts("[#6]-[#7]", 0),
    Smarts("[#8]", 1),
    Smarts("[C;H3,H4]", 0),
    // 161
    Smarts("[#7]", 0),
    Smarts("a", 0),
    Smarts("*1~*~*~*~*~*~1", 0),
    Smarts("[#8]", 0),
    Smarts("[R]", 0),
    Fragments,
];

#[cfg(test)]
mod tests {
    use crate::fingerprint::{FingerprintEngine, FingerprintKind};
    use crate::{parse_smiles, sanitize};

    fn maccs(smiles: &str) -> Vec<usize> {
        let molecule = sanitize(parse_smiles(smiles).expect("Failed to parse SMILES")).expect("Failed to sanitize");
        FingerprintEngine::new(FingerprintKind::MACCS)
            .compute(&molecule)
            .expect("Failed to fingerprint")
            .ones()
            .collect()
    }

    #[test]
    fn test_benzene_keys() {
        let bits = maccs("c1ccccc1");
        for bit in [161, 162, 164] {
            assert!(bits.contains(&bit), "bit {bit} missing from {bits:?}");
        }
        assert!(!bits.contains(&163), "benzene has no oxygen");
    }

    #[test]
    fn test_ethanol_keys() {
        let bits = maccs("CCO");
        for bit in [163, 156, 138, 159, 113] {
            assert!(bits.contains(&bit), "bit {bit} missing from {bits:?}");
        }
        for bit in [161, 162, 164, 145, 139] {
            assert!(!bits.contains(&bit), "bit {bit} unexpected in {bits:?}");
        }
    }

    #[test]
    fn test_isotope_key() {
        assert_eq!(maccs("[13CH4]"), vec![0, 159]);
        assert!(!maccs("C").contains(&0));
    }

    #[test]
    fn test_key_44_is_never_set() {
        for smiles in ["CCO", "c1ccccc1C(=O)O", "CC(=O)Nc1ccc(O)cc1", "[13CH4]"] {
            assert!(!maccs(smiles).contains(&43), "{smiles}");
        }
    }
}
