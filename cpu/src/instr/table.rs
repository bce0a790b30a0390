// SPDX-License-Identifier: MPL-2.0

//! The opcode list.
//!
//! Operand kinds are abbreviated by their data-type letter; `rb` and `rw` are byte and word branch
//! displacements.

use super::{Descriptor, Kind};

def_catalog! {
    Halt    = 0x00 "halt" [],
    Nop     = 0x01 "nop" [],
    Rei     = 0x02 "rei" [],
    Bpt     = 0x03 "bpt" [],
    Ret     = 0x04 "ret" [],
    Rsb     = 0x05 "rsb" [],
    Ldpctx  = 0x06 "ldpctx" [],
    Svpctx  = 0x07 "svpctx" [],

    Cvtps   = 0x08 "cvtps" [w b w b],
    Cvtsp   = 0x09 "cvtsp" [w b w b],
    Index   = 0x0a "index" [l l l l l l],
    Crc     = 0x0b "crc" [b l w b],
    Prober  = 0x0c "prober" [b w b],
    Probew  = 0x0d "probew" [b w b],
    Insque  = 0x0e "insque" [b b],
    Remque  = 0x0f "remque" [b l],

    Bsbb    = 0x10 "bsbb" [rb],
    Brb     = 0x11 "brb" [rb],
    Bneq    = 0x12 "bneq" [rb],
    Beql    = 0x13 "beql" [rb],
    Bgtr    = 0x14 "bgtr" [rb],
    Bleq    = 0x15 "bleq" [rb],
    Jsb     = 0x16 "jsb" [b],
    Jmp     = 0x17 "jmp" [b],

    Bgeq    = 0x18 "bgeq" [rb],
    Blss    = 0x19 "blss" [rb],
    Bgtru   = 0x1a "bgtru" [rb],
    Blequ   = 0x1b "blequ" [rb],
    Bvc     = 0x1c "bvc" [rb],
    Bvs     = 0x1d "bvs" [rb],
    Bcc     = 0x1e "bcc" [rb],
    Blssu   = 0x1f "blssu" [rb],

    Addp4   = 0x20 "addp4" [w b w b],
    Addp6   = 0x21 "addp6" [w b w b w b],
    Subp4   = 0x22 "subp4" [w b w b],
    Subp6   = 0x23 "subp6" [w b w b w b],
    Cvtpt   = 0x24 "cvtpt" [w b b w b],
    Mulp    = 0x25 "mulp" [w b w b w b],
    Cvttp   = 0x26 "cvttp" [w b b w b],
    Divp    = 0x27 "divp" [w b w b w b],

    Movc3   = 0x28 "movc3" [w b b],
    Cmpc3   = 0x29 "cmpc3" [w b b],
    Scanc   = 0x2a "scanc" [w b b b],
    Spanc   = 0x2b "spanc" [w b b b],
    Movc5   = 0x2c "movc5" [w b b w b],
    Cmpc5   = 0x2d "cmpc5" [w b b w b],
    Movtc   = 0x2e "movtc" [w b b b w b],
    Movtuc  = 0x2f "movtuc" [w b b b w b],

    Bsbw    = 0x30 "bsbw" [rw],
    Brw     = 0x31 "brw" [rw],
    Cvtwl   = 0x32 "cvtwl" [w l],
    Cvtwb   = 0x33 "cvtwb" [w b],
    Movp    = 0x34 "movp" [w b b],
    Cmpp3   = 0x35 "cmpp3" [w b b],
    Cvtpl   = 0x36 "cvtpl" [w b l],
    Cmpp4   = 0x37 "cmpp4" [w b w b],

    Editpc  = 0x38 "editpc" [w b b b],
    Matchc  = 0x39 "matchc" [w b w b],
    Locc    = 0x3a "locc" [b w b],
    Skpc    = 0x3b "skpc" [b w b],
    Movzwl  = 0x3c "movzwl" [w l],
    Acbw    = 0x3d "acbw" [w w w rw],
    Movaw   = 0x3e "movaw" [w l],
    Pushaw  = 0x3f "pushaw" [w],

    Addf2   = 0x40 "addf2" [f f],
    Addf3   = 0x41 "addf3" [f f f],
    Subf2   = 0x42 "subf2" [f f],
    Subf3   = 0x43 "subf3" [f f f],
    Mulf2   = 0x44 "mulf2" [f f],
    Mulf3   = 0x45 "mulf3" [f f f],
    Divf2   = 0x46 "divf2" [f f],
    Divf3   = 0x47 "divf3" [f f f],

    Cvtfb   = 0x48 "cvtfb" [f b],
    Cvtfw   = 0x49 "cvtfw" [f w],
    Cvtfl   = 0x4a "cvtfl" [f l],
    Cvtrfl  = 0x4b "cvtrfl" [f l],
    Cvtbf   = 0x4c "cvtbf" [b f],
    Cvtwf   = 0x4d "cvtwf" [w f],
    Cvtlf   = 0x4e "cvtlf" [l f],
    Acbf    = 0x4f "acbf" [f f f rw],

    Movf    = 0x50 "movf" [f f],
    Cmpf    = 0x51 "cmpf" [f f],
    Mnegf   = 0x52 "mnegf" [f f],
    Tstf    = 0x53 "tstf" [f],
    Emodf   = 0x54 "emodf" [f b f l f],
    Polyf   = 0x55 "polyf" [f w b],
    Cvtfd   = 0x56 "cvtfd" [f d],

    Adawi   = 0x58 "adawi" [w w],
    Insqhi  = 0x5c "insqhi" [b q],
    Insqti  = 0x5d "insqti" [b q],
    Remqhi  = 0x5e "remqhi" [q l],
    Remqti  = 0x5f "remqti" [q l],

    Addd2   = 0x60 "addd2" [d d],
    Addd3   = 0x61 "addd3" [d d d],
    Subd2   = 0x62 "subd2" [d d],
    Subd3   = 0x63 "subd3" [d d d],
    Muld2   = 0x64 "muld2" [d d],
    Muld3   = 0x65 "muld3" [d d d],
    Divd2   = 0x66 "divd2" [d d],
    Divd3   = 0x67 "divd3" [d d d],

    Cvtdb   = 0x68 "cvtdb" [d b],
    Cvtdw   = 0x69 "cvtdw" [d w],
    Cvtdl   = 0x6a "cvtdl" [d l],
    Cvtrdl  = 0x6b "cvtrdl" [d l],
    Cvtbd   = 0x6c "cvtbd" [b d],
    Cvtwd   = 0x6d "cvtwd" [w d],
    Cvtld   = 0x6e "cvtld" [l d],
    Acbd    = 0x6f "acbd" [d d d rw],

    Movd    = 0x70 "movd" [d d],
    Cmpd    = 0x71 "cmpd" [d d],
    Mnegd   = 0x72 "mnegd" [d d],
    Tstd    = 0x73 "tstd" [d],
    Emodd   = 0x74 "emodd" [d b d l d],
    Polyd   = 0x75 "polyd" [d w b],
    Cvtdf   = 0x76 "cvtdf" [d f],

    Ashl    = 0x78 "ashl" [b l l],
    Ashq    = 0x79 "ashq" [b q q],
    Emul    = 0x7a "emul" [l l l q],
    Ediv    = 0x7b "ediv" [l q l l],
    Clrq    = 0x7c "clrq" [q],
    Movq    = 0x7d "movq" [q q],
    Movaq   = 0x7e "movaq" [q l],
    Pushaq  = 0x7f "pushaq" [q],

    Addb2   = 0x80 "addb2" [b b],
    Addb3   = 0x81 "addb3" [b b b],
    Subb2   = 0x82 "subb2" [b b],
    Subb3   = 0x83 "subb3" [b b b],
    Mulb2   = 0x84 "mulb2" [b b],
    Mulb3   = 0x85 "mulb3" [b b b],
    Divb2   = 0x86 "divb2" [b b],
    Divb3   = 0x87 "divb3" [b b b],

    Bisb2   = 0x88 "bisb2" [b b],
    Bisb3   = 0x89 "bisb3" [b b b],
    Bicb2   = 0x8a "bicb2" [b b],
    Bicb3   = 0x8b "bicb3" [b b b],
    Xorb2   = 0x8c "xorb2" [b b],
    Xorb3   = 0x8d "xorb3" [b b b],
    Mnegb   = 0x8e "mnegb" [b b],
    Caseb   = 0x8f "caseb" [b b b],

    Movb    = 0x90 "movb" [b b],
    Cmpb    = 0x91 "cmpb" [b b],
    Mcomb   = 0x92 "mcomb" [b b],
    Bitb    = 0x93 "bitb" [b b],
    Clrb    = 0x94 "clrb" [b],
    Tstb    = 0x95 "tstb" [b],
    Incb    = 0x96 "incb" [b],
    Decb    = 0x97 "decb" [b],

    Cvtbl   = 0x98 "cvtbl" [b l],
    Cvtbw   = 0x99 "cvtbw" [b w],
    Movzbl  = 0x9a "movzbl" [b l],
    Movzbw  = 0x9b "movzbw" [b w],
    Rotl    = 0x9c "rotl" [b l l],
    Acbb    = 0x9d "acbb" [b b b rw],
    Movab   = 0x9e "movab" [b l],
    Pushab  = 0x9f "pushab" [b],

    Addw2   = 0xa0 "addw2" [w w],
    Addw3   = 0xa1 "addw3" [w w w],
    Subw2   = 0xa2 "subw2" [w w],
    Subw3   = 0xa3 "subw3" [w w w],
    Mulw2   = 0xa4 "mulw2" [w w],
    Mulw3   = 0xa5 "mulw3" [w w w],
    Divw2   = 0xa6 "divw2" [w w],
    Divw3   = 0xa7 "divw3" [w w w],

    Bisw2   = 0xa8 "bisw2" [w w],
    Bisw3   = 0xa9 "bisw3" [w w w],
    Bicw2   = 0xaa "bicw2" [w w],
    Bicw3   = 0xab "bicw3" [w w w],
    Xorw2   = 0xac "xorw2" [w w],
    Xorw3   = 0xad "xorw3" [w w w],
    Mnegw   = 0xae "mnegw" [w w],
    Casew   = 0xaf "casew" [w w w],

    Movw    = 0xb0 "movw" [w w],
    Cmpw    = 0xb1 "cmpw" [w w],
    Mcomw   = 0xb2 "mcomw" [w w],
    Bitw    = 0xb3 "bitw" [w w],
    Clrw    = 0xb4 "clrw" [w],
    Tstw    = 0xb5 "tstw" [w],
    Incw    = 0xb6 "incw" [w],
    Decw    = 0xb7 "decw" [w],

    Bispsw  = 0xb8 "bispsw" [w],
    Bicpsw  = 0xb9 "bicpsw" [w],
    Popr    = 0xba "popr" [w],
    Pushr   = 0xbb "pushr" [w],
    Chmk    = 0xbc "chmk" [w],
    Chme    = 0xbd "chme" [w],
    Chms    = 0xbe "chms" [w],
    Chmu    = 0xbf "chmu" [w],

    Addl2   = 0xc0 "addl2" [l l],
    Addl3   = 0xc1 "addl3" [l l l],
    Subl2   = 0xc2 "subl2" [l l],
    Subl3   = 0xc3 "subl3" [l l l],
    Mull2   = 0xc4 "mull2" [l l],
    Mull3   = 0xc5 "mull3" [l l l],
    Divl2   = 0xc6 "divl2" [l l],
    Divl3   = 0xc7 "divl3" [l l l],

    Bisl2   = 0xc8 "bisl2" [l l],
    Bisl3   = 0xc9 "bisl3" [l l l],
    Bicl2   = 0xca "bicl2" [l l],
    Bicl3   = 0xcb "bicl3" [l l l],
    Xorl2   = 0xcc "xorl2" [l l],
    Xorl3   = 0xcd "xorl3" [l l l],
    Mnegl   = 0xce "mnegl" [l l],
    Casel   = 0xcf "casel" [l l l],

    Movl    = 0xd0 "movl" [l l],
    Cmpl    = 0xd1 "cmpl" [l l],
    Mcoml   = 0xd2 "mcoml" [l l],
    Bitl    = 0xd3 "bitl" [l l],
    Clrl    = 0xd4 "clrl" [l],
    Tstl    = 0xd5 "tstl" [l],
    Incl    = 0xd6 "incl" [l],
    Decl    = 0xd7 "decl" [l],

    Adwc    = 0xd8 "adwc" [l l],
    Sbwc    = 0xd9 "sbwc" [l l],
    Mtpr    = 0xda "mtpr" [l l],
    Mfpr    = 0xdb "mfpr" [l l],
    Movpsl  = 0xdc "movpsl" [l],
    Pushl   = 0xdd "pushl" [l],
    Moval   = 0xde "moval" [l l],
    Pushal  = 0xdf "pushal" [l],

    Bbs     = 0xe0 "bbs" [l b rb],
    Bbc     = 0xe1 "bbc" [l b rb],
    Bbss    = 0xe2 "bbss" [l b rb],
    Bbcs    = 0xe3 "bbcs" [l b rb],
    Bbsc    = 0xe4 "bbsc" [l b rb],
    Bbcc    = 0xe5 "bbcc" [l b rb],
    Bbssi   = 0xe6 "bbssi" [l b rb],
    Bbcci   = 0xe7 "bbcci" [l b rb],

    Blbs    = 0xe8 "blbs" [l rb],
    Blbc    = 0xe9 "blbc" [l rb],
    Ffs     = 0xea "ffs" [l b b l],
    Ffc     = 0xeb "ffc" [l b b l],
    Cmpv    = 0xec "cmpv" [l b b l],
    Cmpzv   = 0xed "cmpzv" [l b b l],
    Extv    = 0xee "extv" [l b b l],
    Extzv   = 0xef "extzv" [l b b l],

    Insv    = 0xf0 "insv" [l l b b],
    Acbl    = 0xf1 "acbl" [l l l rw],
    Aoblss  = 0xf2 "aoblss" [l l rb],
    Aobleq  = 0xf3 "aobleq" [l l rb],
    Sobgeq  = 0xf4 "sobgeq" [l rb],
    Sobgtr  = 0xf5 "sobgtr" [l rb],
    Cvtlb   = 0xf6 "cvtlb" [l b],
    Cvtlw   = 0xf7 "cvtlw" [l w],

    Ashp    = 0xf8 "ashp" [b w b b w b],
    Cvtlp   = 0xf9 "cvtlp" [l w b],
    Callg   = 0xfa "callg" [b b],
    Calls   = 0xfb "calls" [l b],
    Xfc     = 0xfc "xfc" [],

    Cvtdh   = 0xfd32 "cvtdh" [d h],
    Cvtgf   = 0xfd33 "cvtgf" [g f],

    Addg2   = 0xfd40 "addg2" [g g],
    Addg3   = 0xfd41 "addg3" [g g g],
    Subg2   = 0xfd42 "subg2" [g g],
    Subg3   = 0xfd43 "subg3" [g g g],
    Mulg2   = 0xfd44 "mulg2" [g g],
    Mulg3   = 0xfd45 "mulg3" [g g g],
    Divg2   = 0xfd46 "divg2" [g g],
    Divg3   = 0xfd47 "divg3" [g g g],
    Cvtgb   = 0xfd48 "cvtgb" [g b],
    Cvtgw   = 0xfd49 "cvtgw" [g w],
    Cvtgl   = 0xfd4a "cvtgl" [g l],
    Cvtrgl  = 0xfd4b "cvtrgl" [g l],
    Cvtbg   = 0xfd4c "cvtbg" [b g],
    Cvtwg   = 0xfd4d "cvtwg" [w g],
    Cvtlg   = 0xfd4e "cvtlg" [l g],
    Acbg    = 0xfd4f "acbg" [g g g rw],

    Movg    = 0xfd50 "movg" [g g],
    Cmpg    = 0xfd51 "cmpg" [g g],
    Mnegg   = 0xfd52 "mnegg" [g g],
    Tstg    = 0xfd53 "tstg" [g],
    Emodg   = 0xfd54 "emodg" [g w g l g],
    Polyg   = 0xfd55 "polyg" [g w b],
    Cvtgh   = 0xfd56 "cvtgh" [g h],

    Addh2   = 0xfd60 "addh2" [h h],
    Addh3   = 0xfd61 "addh3" [h h h],
    Subh2   = 0xfd62 "subh2" [h h],
    Subh3   = 0xfd63 "subh3" [h h h],
    Mulh2   = 0xfd64 "mulh2" [h h],
    Mulh3   = 0xfd65 "mulh3" [h h h],
    Divh2   = 0xfd66 "divh2" [h h],
    Divh3   = 0xfd67 "divh3" [h h h],
    Cvthb   = 0xfd68 "cvthb" [h b],
    Cvthw   = 0xfd69 "cvthw" [h w],
    Cvthl   = 0xfd6a "cvthl" [h l],
    Cvtrhl  = 0xfd6b "cvtrhl" [h l],
    Cvtbh   = 0xfd6c "cvtbh" [b h],
    Cvtwh   = 0xfd6d "cvtwh" [w h],
    Cvtlh   = 0xfd6e "cvtlh" [l h],
    Acbh    = 0xfd6f "acbh" [h h h rw],

    Movh    = 0xfd70 "movh" [h h],
    Cmph    = 0xfd71 "cmph" [h h],
    Mnegh   = 0xfd72 "mnegh" [h h],
    Tsth    = 0xfd73 "tsth" [h],
    Emodh   = 0xfd74 "emodh" [h w h l h],
    Polyh   = 0xfd75 "polyh" [h w b],
    Cvthg   = 0xfd76 "cvthg" [h g],
    Clrh    = 0xfd7c "clrh" [h],
    Movo    = 0xfd7d "movo" [o o],
    Movah   = 0xfd7e "movah" [h l],
    Pushah  = 0xfd7f "pushah" [h],

    Cvtfh   = 0xfd98 "cvtfh" [f h],
    Cvtfg   = 0xfd99 "cvtfg" [f g],

    Cvthf   = 0xfdf6 "cvthf" [h f],
    Cvthd   = 0xfdf7 "cvthd" [h d],

    Bugl    = 0xfffd "bugl" [l],
    Bugw    = 0xfffe "bugw" [w],
}
